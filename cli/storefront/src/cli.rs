use clap::{Args, Parser, Subcommand};

const SHORT_HELP: &str = "Browse the storefront, manage your cart, and check out.";

#[derive(Debug, Parser)]
#[command(name = "storefront", about = SHORT_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Sign in and store the session.")]
    Login(LoginArgs),
    #[command(about = "Sign out and clear the session.")]
    Logout,
    #[command(about = "Create a new account.")]
    Register(RegisterArgs),
    #[command(about = "Show the signed-in user.")]
    Whoami,
    #[command(about = "Search the product catalog.")]
    Search(SearchArgs),
    #[command(about = "List product categories.")]
    Categories,
    #[command(subcommand, about = "Show and modify the shopping cart.")]
    Cart(CartCommand),
    #[command(subcommand, about = "Select cart items for checkout.")]
    Select(SelectCommand),
    #[command(about = "Place an order for the selected cart items.")]
    Checkout,
    #[command(about = "List past orders.")]
    Orders(OrdersArgs),
    #[command(about = "Show a single order.")]
    Order(OrderArgs),
    #[command(about = "Show the resolved configuration.")]
    Config,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(help = "Account email address.")]
    #[arg(short, long, value_name = "EMAIL")]
    pub email: String,
    #[arg(help = "Account password.")]
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(short, long, value_name = "EMAIL")]
    pub email: String,
    #[arg(long, value_name = "PHONE")]
    pub phone: String,
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: String,
    #[arg(help = "Must match the password.")]
    #[arg(long, value_name = "PASSWORD")]
    pub confirm_password: String,
}

#[derive(Debug, Args, Default)]
pub struct SearchArgs {
    #[arg(help = "Free-text search over titles and descriptions.")]
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,
    #[arg(short, long, value_name = "ID")]
    pub category: Option<String>,
    #[arg(long, value_name = "PRICE")]
    pub min_price: Option<f64>,
    #[arg(long, value_name = "PRICE")]
    pub max_price: Option<f64>,
    #[arg(help = "Zero-based page number.")]
    #[arg(short, long, value_name = "N")]
    pub page: Option<u32>,
    #[arg(long, value_name = "N")]
    pub size: Option<u32>,
    #[arg(help = "Sort expression, e.g. 'price,asc'.")]
    #[arg(short, long, value_name = "SORT")]
    pub sort: Option<String>,
    #[arg(help = "Discard the remembered filters before applying these.")]
    #[arg(long)]
    pub reset: bool,
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    #[command(about = "Show the cart and the current selection.")]
    Show,
    #[command(about = "Add a product to the cart.")]
    Add(CartAddArgs),
    #[command(about = "Change the quantity of a cart item.")]
    Update(CartUpdateArgs),
    #[command(about = "Remove an item from the cart.")]
    Remove(CartItemArgs),
    #[command(about = "Remove every item from the cart.")]
    Clear,
}

#[derive(Debug, Args)]
pub struct CartAddArgs {
    #[arg(value_name = "PRODUCT_ID")]
    pub product_id: String,
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub qty: u32,
}

#[derive(Debug, Args)]
pub struct CartUpdateArgs {
    #[arg(value_name = "ITEM_ID")]
    pub item_id: String,
    #[arg(help = "New quantity; zero removes the item.")]
    #[arg(short, long, value_name = "N")]
    pub qty: u32,
}

#[derive(Debug, Args)]
pub struct CartItemArgs {
    #[arg(value_name = "ITEM_ID")]
    pub item_id: String,
}

#[derive(Debug, Subcommand)]
pub enum SelectCommand {
    #[command(about = "Toggle one item in the checkout selection.")]
    Toggle(CartItemArgs),
    #[command(about = "Select every cart item.")]
    All,
    #[command(about = "Clear the selection.")]
    None,
}

#[derive(Debug, Args)]
pub struct OrdersArgs {
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    pub page: u32,
    #[arg(short, long, value_name = "N")]
    pub size: Option<u32>,
}

#[derive(Debug, Args)]
pub struct OrderArgs {
    #[arg(value_name = "ORDER_ID")]
    pub id: String,
}

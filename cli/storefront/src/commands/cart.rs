use anyhow::Result;
use storefront_sdk::CartStore;

use crate::cli::{CartAddArgs, CartItemArgs, CartUpdateArgs, SelectCommand};
use crate::commands::Context;
use crate::message;

pub(crate) async fn show(ctx: Context) -> Result<()> {
    let store = ctx.cart_store()?;
    store.load().await;
    print_cart(&store);
    Ok(())
}

impl CartAddArgs {
    pub(crate) async fn handle(self, ctx: Context) -> Result<()> {
        let store = ctx.cart_store()?;
        match store.add_item(&self.product_id, self.qty).await {
            Ok(()) => {
                println!("{}", message::format_updated("Added to cart"));
                print_cart(&store);
                Ok(())
            },
            Err(err) => Err(err.into()),
        }
    }
}

impl CartUpdateArgs {
    pub(crate) async fn handle(self, ctx: Context) -> Result<()> {
        let store = ctx.cart_store()?;
        match store.update_quantity(&self.item_id, self.qty).await {
            Ok(()) => {
                print_cart(&store);
                Ok(())
            },
            Err(err) if err.is_stock_conflict() => {
                // quantities shown below are the re-synced server truth
                print_cart(&store);
                Err(err.into())
            },
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) async fn remove(ctx: Context, args: CartItemArgs) -> Result<()> {
    let store = ctx.cart_store()?;
    store.remove_item(&args.item_id).await?;
    print_cart(&store);
    Ok(())
}

pub(crate) async fn clear(ctx: Context) -> Result<()> {
    let store = ctx.cart_store()?;
    store.clear().await?;
    println!("{}", message::format_updated("Cart cleared"));
    Ok(())
}

pub(crate) async fn select(ctx: Context, command: SelectCommand) -> Result<()> {
    let store = ctx.cart_store()?;
    // selection ops validate against the current snapshot
    store.load().await;
    match command {
        SelectCommand::Toggle(args) => store.toggle(&args.item_id)?,
        SelectCommand::All => store.select_all()?,
        SelectCommand::None => store.clear_selection()?,
    }
    print_cart(&store);
    Ok(())
}

pub(crate) async fn checkout(ctx: Context) -> Result<()> {
    let store = ctx.cart_store()?;
    store.load().await;
    match store.checkout().await {
        Ok(receipt) => {
            println!(
                "{}",
                message::format_updated(format!("Order {} placed", receipt.id))
            );
            if let Some(note) = receipt.message {
                println!("{note}");
            }
            Ok(())
        },
        Err(err) if err.is_stock_conflict() => {
            // selection is preserved; show the re-synced cart so the user
            // can adjust quantities and retry
            print_cart(&store);
            Err(err.into())
        },
        Err(err) => Err(err.into()),
    }
}

fn print_cart(store: &CartStore) {
    let Some(cart) = store.snapshot() else {
        println!("(cart not available, are you signed in?)");
        return;
    };
    if cart.items.is_empty() {
        println!("The cart is empty.");
        return;
    }
    let selection = store.selection();
    for item in &cart.items {
        let marker = if selection.contains(&item.id) { "*" } else { " " };
        println!(
            "{marker} {}  {}  {} × {:.2} = {:.2}",
            item.id, item.title, item.qty, item.unit_price, item.line_subtotal
        );
    }
    println!("total: {:.2} ({} items)", cart.total, cart.item_count);
    if !selection.is_empty() {
        println!(
            "selected for checkout: {} ({:.2})",
            store.selected_count(),
            store.selected_subtotal()
        );
    }
}

mod cli;
mod commands;
mod config;
mod logger;
mod message;

use anyhow::Result;
use clap::Parser;
use storefront_client::ApiError;
use storefront_sdk::{CartError, CatalogError};
use tracing::debug;

use crate::cli::{CartCommand, Cli, Command};
use crate::commands::Context;
use crate::config::Config;

#[tokio::main]
async fn main() {
    logger::init_logger();
    if let Err(err) = run().await {
        eprintln!("{}", message::format_error(format!("{err:#}")));
        if is_auth_failure(&err) {
            eprintln!("Sign in again with: storefront login --email <EMAIL> --password <PASSWORD>");
        }
        std::process::exit(1);
    }
}

// The store errors wrap ApiError transparently, so the wrapped value does
// not show up in the chain on its own; unwrap each by hand.
fn is_auth_failure(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return api.is_auth();
        }
        if let Some(CartError::Api(api)) = cause.downcast_ref::<CartError>() {
            return api.is_auth();
        }
        if let Some(CatalogError::Api(api)) = cause.downcast_ref::<CatalogError>() {
            return api.is_auth();
        }
        false
    })
}

async fn run() -> Result<()> {
    let args = Cli::parse();
    debug!("{args:?}");

    let config = Config::load()?;
    match args.command {
        Command::Login(args) => args.handle(Context::new(config)?).await,
        Command::Logout => commands::auth::logout(Context::new(config)?).await,
        Command::Register(args) => args.handle(Context::new(config)?).await,
        Command::Whoami => commands::auth::whoami(Context::new(config)?).await,
        Command::Search(args) => args.handle(Context::new(config)?).await,
        Command::Categories => commands::catalog::categories(Context::new(config)?).await,
        Command::Cart(command) => {
            let ctx = Context::new(config)?;
            match command {
                CartCommand::Show => commands::cart::show(ctx).await,
                CartCommand::Add(args) => args.handle(ctx).await,
                CartCommand::Update(args) => args.handle(ctx).await,
                CartCommand::Remove(args) => commands::cart::remove(ctx, args).await,
                CartCommand::Clear => commands::cart::clear(ctx).await,
            }
        },
        Command::Select(command) => commands::cart::select(Context::new(config)?, command).await,
        Command::Checkout => commands::cart::checkout(Context::new(config)?).await,
        Command::Orders(args) => args.handle(Context::new(config)?).await,
        Command::Order(args) => args.handle(Context::new(config)?).await,
        Command::Config => commands::general::show_config(&config),
    }
}

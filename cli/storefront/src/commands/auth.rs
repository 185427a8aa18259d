use anyhow::{ensure, Context as _, Result};
use storefront_client::types::RegisterRequest;

use crate::cli::{LoginArgs, RegisterArgs};
use crate::commands::Context;
use crate::message;

impl LoginArgs {
    pub(crate) async fn handle(self, ctx: Context) -> Result<()> {
        ctx.client.login(&self.email, &self.password).await?;
        println!(
            "{}",
            message::format_updated(format!("Signed in as {}", self.email))
        );
        Ok(())
    }
}

pub(crate) async fn logout(ctx: Context) -> Result<()> {
    ctx.client.logout().await?;
    println!("{}", message::format_updated("Signed out"));
    Ok(())
}

impl RegisterArgs {
    pub(crate) async fn handle(self, ctx: Context) -> Result<()> {
        // rejected locally, no backend call
        ensure!(
            self.password == self.confirm_password,
            "passwords do not match"
        );
        let response = ctx
            .client
            .register(&RegisterRequest {
                email: self.email,
                phone: self.phone,
                password: self.password,
                confirm_password: self.confirm_password,
            })
            .await?;
        let note = response
            .message
            .unwrap_or_else(|| format!("Account {} created", response.email));
        println!("{}", message::format_updated(note));
        println!("Sign in with: storefront login --email {}", response.email);
        Ok(())
    }
}

pub(crate) async fn whoami(ctx: Context) -> Result<()> {
    let user = ctx
        .client
        .me()
        .await
        .context("could not fetch the signed-in user (try `storefront login`)")?;
    println!("{}", user.email);
    if let Some(phone) = user.phone {
        println!("phone: {phone}");
    }
    println!("id: {}", user.id);
    Ok(())
}

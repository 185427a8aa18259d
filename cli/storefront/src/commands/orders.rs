use anyhow::Result;
use storefront_client::types::OrderDto;

use crate::cli::{OrderArgs, OrdersArgs};
use crate::commands::Context;

impl OrdersArgs {
    pub(crate) async fn handle(self, ctx: Context) -> Result<()> {
        let store = ctx.orders_store();
        let size = self.size.unwrap_or(ctx.config.orders_page_size);
        let page = store.list(self.page, size).await?;
        if page.content.is_empty() {
            println!("No orders yet.");
            return Ok(());
        }
        for order in &page.content {
            println!(
                "{}  {}  {:?}  {:.2}",
                order.id, order.created_at, order.status, order.total
            );
        }
        println!(
            "page {}/{} ({} orders)",
            page.number + 1,
            page.total_pages,
            page.total_elements
        );
        Ok(())
    }
}

impl OrderArgs {
    pub(crate) async fn handle(self, ctx: Context) -> Result<()> {
        let order = ctx.orders_store().get(&self.id).await?;
        print_order(&order);
        Ok(())
    }
}

fn print_order(order: &OrderDto) {
    println!("order {}  {}  {:?}", order.id, order.created_at, order.status);
    for item in &order.items {
        println!(
            "  {}  {} × {:.2} = {:.2}",
            item.title, item.qty, item.unit_price, item.line_total
        );
    }
    println!("total: {:.2}", order.total);
}

use anyhow::Result;
use storefront_client::types::ProductQuery;
use storefront_sdk::CatalogStore;

use crate::cli::SearchArgs;
use crate::commands::Context;

impl SearchArgs {
    pub(crate) async fn handle(self, ctx: Context) -> Result<()> {
        let store = ctx.catalog_store()?;
        let args = self;
        store
            .search(|query| {
                if args.reset {
                    *query = ProductQuery::default();
                }
                if let Some(text) = args.query {
                    query.text = Some(text);
                }
                if let Some(category_id) = args.category {
                    query.category_id = Some(category_id);
                }
                if let Some(min_price) = args.min_price {
                    query.min_price = Some(min_price);
                }
                if let Some(max_price) = args.max_price {
                    query.max_price = Some(max_price);
                }
                if let Some(size) = args.size {
                    query.page_size = size;
                }
                if let Some(sort) = args.sort {
                    query.sort = Some(sort);
                }
                // filter changes restart from the first page unless a
                // page was requested explicitly
                query.page = args.page.unwrap_or(0);
            })
            .await?;
        print_page(&store);
        Ok(())
    }
}

pub(crate) async fn categories(ctx: Context) -> Result<()> {
    let store = ctx.catalog_store()?;
    store.load_categories().await?;
    for category in store.categories() {
        println!("{}  {}", category.id, category.name);
    }
    Ok(())
}

fn print_page(store: &CatalogStore) {
    let page = store.page();
    if page.content.is_empty() {
        println!("No products found.");
        return;
    }
    for product in &page.content {
        println!("{}  {:>8.2}  {}", product.id, product.price, product.title);
    }
    println!(
        "page {}/{} ({} products)",
        page.number + 1,
        page.total_pages,
        page.total_elements
    );
}

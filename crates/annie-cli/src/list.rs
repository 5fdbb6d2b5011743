//! Read-only listing commands for the CLI.
//!
//! `accounts` and `apps` print what the API returns so product ids can be
//! copied into `ANNIE_SKIP_APPS` or a corrections file.

use annie_client::{Account, AnnieClient, Product};

fn render_account(account: &Account) -> String {
    match (&account.vertical, &account.market) {
        (Some(vertical), Some(market)) => {
            format!("{:<12} {} ({vertical}/{market})", account.id, account.name)
        }
        _ => format!("{:<12} {}", account.id, account.name),
    }
}

fn render_product(product: &Product) -> String {
    let marker = if product.is_not_applicable() {
        "  (skipped: n/a)"
    } else {
        ""
    };
    format!("{:<12} {}{marker}", product.id, product.title())
}

/// Print every account visible to the API key.
///
/// # Errors
///
/// Returns an error if the account listing request fails.
pub(crate) async fn run_list_accounts(client: &AnnieClient) -> anyhow::Result<()> {
    let accounts = client.list_accounts().await?;
    if accounts.is_empty() {
        println!("no accounts visible to this API key");
        return Ok(());
    }
    for account in &accounts {
        println!("{}", render_account(account));
    }
    tracing::debug!(count = accounts.len(), "listed accounts");
    Ok(())
}

/// Print the products of one account.
///
/// # Errors
///
/// Returns an error if the product listing request fails.
pub(crate) async fn run_list_apps(client: &AnnieClient, account_id: &str) -> anyhow::Result<()> {
    let products = client.list_products(account_id).await?;
    if products.is_empty() {
        println!("account {account_id} has no products");
        return Ok(());
    }
    for product in &products {
        println!("{}", render_product(product));
    }
    tracing::debug!(account_id, count = products.len(), "listed products");
    Ok(())
}

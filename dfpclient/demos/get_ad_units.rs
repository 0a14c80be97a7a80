//! Lists the ad units under a parent, page by page.
//!
//! ```sh
//! DFP_EMAIL=me@example.com DFP_PASSWORD=secret DFP_NETWORK=1234 \
//!     cargo run -p dfpclient --example get_ad_units -- <parent-id>
//! ```

use anyhow::{Context, Result};
use dfpclient::{Config, DfpClient, Headers, Statement, Value, WireValue, init_logging};
use std::env;

const PAGE_SIZE: usize = 500;

fn main() -> Result<()> {
    let config = Config::load("")?;
    init_logging(&config)?;

    let parent_id = env::args().nth(1).context("usage: get_ad_units <parent-id>")?;
    let email = env::var("DFP_EMAIL").context("DFP_EMAIL is not set")?;
    let password = env::var("DFP_PASSWORD").context("DFP_PASSWORD is not set")?;

    let mut headers = Headers::client_login(email, password, "get_ad_units demo");
    if let Ok(network) = env::var("DFP_NETWORK") {
        headers = headers.with_network_code(network);
    }

    let client = DfpClient::builder(headers).config(config).build()?;
    let inventory = client.service("InventoryService")?;

    let mut offset = 0;
    loop {
        let statement = Statement::new(format!(
            "WHERE parentId = :parentId LIMIT {PAGE_SIZE} OFFSET {offset}"
        ))
        .bind("parentId", Value::number(&parent_id)?);

        let page = inventory.get_by_statement(statement)?;
        let results = page
            .get("results")
            .and_then(WireValue::as_seq)
            .unwrap_or_default();

        for ad_unit in results {
            println!(
                "{:>12}  {}",
                ad_unit.get("id").and_then(WireValue::as_str).unwrap_or("-"),
                ad_unit.get("name").and_then(WireValue::as_str).unwrap_or("-"),
            );
        }

        if results.len() < PAGE_SIZE {
            break;
        }
        offset += PAGE_SIZE;
    }

    Ok(())
}

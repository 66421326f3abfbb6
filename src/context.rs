//! `ptrail context`: breadcrumb and paragraph for one page of a document.

use anyhow::Result;

use pagetrail_core::context::ContextRequest;
use pagetrail_core::models::PageNumber;

use crate::config::Config;
use crate::db;

pub async fn run_context(
    config: &Config,
    doc_id: &str,
    page: i64,
    query: &str,
    json: bool,
) -> Result<()> {
    let page = PageNumber::try_from(page)?;
    let resolver = config.resolver()?;
    let store = db::open_store(config).await?;

    let req = ContextRequest {
        doc_id,
        page,
        query,
    };
    let response = resolver.resolve(store.as_ref(), &req).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("--- Context ---");
    println!("doc_id:     {}", doc_id);
    println!("page:       {}", response.page);
    if response.breadcrumb.is_empty() {
        println!("breadcrumb: (none)");
    } else {
        println!("breadcrumb: {}", response.breadcrumb.join(" > "));
    }
    println!();

    println!("--- Paragraph ---");
    if response.paragraph.is_empty() {
        println!("(no text on this page)");
    } else {
        println!("{}", response.paragraph);
    }

    Ok(())
}

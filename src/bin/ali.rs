//! AliExpress catalog crawler

use catalog_crawler_lib::Site;
use catalog_crawler_lib::application::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run(Site::AliExpress).await
}

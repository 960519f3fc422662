use anyhow::Result;
use loneworker::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}

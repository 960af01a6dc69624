use census_test_support::CensusFixtureServer;
use rmcp::{transport::stdio, ServiceExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let service = CensusFixtureServer::new().serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

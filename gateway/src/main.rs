//! Entry point: env, logging, then the HTTP server.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    gateway::init_tracing()?;

    let config = gateway::Config::from_env()?;
    gateway::serve(config).await
}

//! fly - serve as a node or join one.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    fly_cli::run().await
}

use clap::Parser;
use so2_flux::cli::{run, Cli};
use so2_flux::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}

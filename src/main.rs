use anyhow::Result;
use budgetbook::cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    budgetbook::logging::init(cli.verbose);
    cli.run().await
}

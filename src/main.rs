use clap::Parser;
use user_service::cli::{self, Cli, Command};
use user_service::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => cli::serve::run(config).await,
        Command::InitSchema => cli::init_schema::run(config).await,
    }
}

use clap::Parser;
use std::path::PathBuf;
use tpen::{Commands, TpenContext};
use tpen_config::ConfigLoader;

#[derive(Parser)]
#[command(name = "tpen")]
#[command(about = "Permissions, credentials and IIIF resources for TPEN projects", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (JSON); defaults to the XDG location when present
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `tpen_cache=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config {
        loader = loader.file(path);
    }
    let config = loader.load()?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    tpen_utils::tracing::init(level).map_err(|e| eyre::eyre!("logging setup failed: {e}"))?;

    let ctx = TpenContext::new(config)?;
    cli.command.execute(&ctx).await?;
    Ok(())
}

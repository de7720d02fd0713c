use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use wbs_engine::cli::{self, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = cli::load_config(&args)?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("Effective data dir: {}", config.data_dir.display());

    if let Err(e) = cli::run(args, config).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use tracing::info;
use vidrec::{demo, init_tracing, AppState, Config};

/// Loads the demo catalog and interactions into the configured store and
/// prints the resulting recommendations.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[arg(long, default_value = demo::DEMO_USER)]
    user_id: String,

    #[arg(short, long, default_value_t = 10)]
    k: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = Config::load_or_default(&args.config)?;
    let state = AppState::new(config).await?;

    demo::seed(&state.ingest_service, &args.user_id).await?;
    info!("Seeded demo catalog for user {}", args.user_id);

    let response = state
        .recommendation_service
        .recommend(&args.user_id, args.k)
        .await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

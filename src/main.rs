use wikiflow::aggregate_core::StdoutSink;
use wikiflow::config::RuntimeConfig;
use wikiflow::stream_core::{SseConnector, StreamController};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = RuntimeConfig::from_env()?;

    // Diagnostics to stderr; rendered reports own stdout.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.rust_log),
    )
    .target(env_logger::Target::Stderr)
    .init();

    // NOTE: Workaround for rustls issue
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Can't set crypto provider to aws_lc_rs");

    log::info!("🚀 Starting wikiflow...");
    log::info!("📊 Configuration:");
    log::info!("   STREAM_URL: {}", config.stream_url);
    log::info!("   Window: {}s", config.window_secs);
    log::info!("   Report interval: {}s", config.report_interval_secs);
    log::info!(
        "   Retries: {} x {}s",
        config.retry_attempts,
        config.retry_delay_secs
    );
    log::info!("   Distinguished domain: {}", config.distinguished_domain);

    let connector = SseConnector::new(config.stream_url.clone())?;
    let sink = StdoutSink::new(config.distinguished_domain.clone());

    let controller = StreamController::new(&config, connector, sink);
    controller.run().await?;

    log::info!("✅ Stream consumer exited");
    Ok(())
}

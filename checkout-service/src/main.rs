use checkout_service::{config::Config, Application};
use service_core::observability::{init_tracing, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(
        &config.service_name,
        &config.logging.level,
        LogFormat::from_json_flag(config.logging.json),
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}

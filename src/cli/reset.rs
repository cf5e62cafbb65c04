use crate::settings::AppConfig;
use anyhow::Context;
use tracing::info;

pub async fn run(config: &AppConfig, name: &str) -> anyhow::Result<()> {
    let breaker = config.breaker(name)?;
    breaker
        .reset()
        .await
        .with_context(|| format!("Failed to reset breaker '{}'", name))?;

    info!(breaker = %name, "Breaker reset");
    println!("✅ Breaker '{}' reset to Closed", name);
    Ok(())
}

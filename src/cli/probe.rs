use crate::settings::AppConfig;
use anyhow::Context;
use reqwest::{Client, Url};
use std::sync::Arc;
use tripwire_wrapper::HttpWrapper;

pub async fn run(config: &AppConfig, url: &str, name: &str) -> anyhow::Result<()> {
    let url = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    let breaker = Arc::new(config.breaker(name)?);
    let http = HttpWrapper::new(Client::new(), breaker.clone());

    match http.get(url.clone()).await {
        Ok(response) => println!("✅ {} -> {}", url, response.status()),
        Err(err) if err.is_circuit_open() => println!("⛔ {} not sent: {}", url, err),
        Err(err) => println!("❌ {} failed: {}", url, err),
    }

    let state = breaker
        .state()
        .await
        .with_context(|| format!("Failed to read breaker '{}'", name))?;
    println!("Breaker '{}' is {}", name, state);
    Ok(())
}

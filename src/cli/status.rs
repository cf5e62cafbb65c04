use crate::settings::AppConfig;
use anyhow::Context;
use tripwire_core::Record;

pub async fn run(config: &AppConfig, name: &str) -> anyhow::Result<()> {
    let breaker = config.breaker(name)?;
    let record = breaker
        .snapshot()
        .await
        .with_context(|| format!("Failed to read breaker '{}'", name))?;

    println!("{}", render(name, &record));
    Ok(())
}

pub(crate) fn render(name: &str, record: &Record) -> String {
    let last_failure = record
        .last_failure_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "Breaker:       {}\nState:         {}\nFailures:      {}\nSuccesses:     {}\nLast failure:  {}",
        name, record.state, record.failures, record.successes, last_failure
    )
}

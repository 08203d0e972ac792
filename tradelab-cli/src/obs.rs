//! Logging setup.

/// Install the global subscriber.
///
/// `TRADELAB_LOG` (EnvFilter syntax) wins over `log_level`. `log_format`
/// selects `json` or the default human-readable output.
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<(), String> {
    let filter = std::env::var("TRADELAB_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    let format = log_format.trim().to_lowercase();
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

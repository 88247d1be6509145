use crate::domain::error::ReviewError;
use crate::infrastructure::config::Logging;
use tracing_subscriber::EnvFilter;

/// Maps the configured level name onto an `EnvFilter` directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

/// Initialize logging with path and level configuration
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(logging: &Logging) -> Result<(), ReviewError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&logging.level)));

    if let Some(path) = logging.path.as_deref().filter(|p| !p.is_empty()) {
        // Log to file
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
        return Ok(());
    }

    // Log to stderr (default)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

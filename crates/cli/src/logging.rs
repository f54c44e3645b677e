use pillsprint_core::config::{AppConfig, LogFormat, LoadOptions};
use tracing::Level;

/// Installs the global subscriber on stderr so command output on stdout stays
/// machine-readable. A config that fails to load falls back to defaults; the
/// command itself reports the config error.
pub fn init(options: &LoadOptions) {
    let logging = AppConfig::load(options.clone()).unwrap_or_default().logging;
    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);
    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

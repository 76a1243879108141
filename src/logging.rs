//! Tracing subscriber setup for the CLI and host apps

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_JSON: &str = "CHILIZ_SESSION_LOG_JSON";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `Json` when `CHILIZ_SESSION_LOG_JSON=1`.
    pub fn from_env() -> Self {
        match std::env::var(ENV_LOG_JSON) {
            Ok(value) if value == "1" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_logging() {
    init_logging_with(LogFormat::from_env());
}

/// Writes to stderr so stdout stays free for command output. `RUST_LOG`
/// filters, default `info`. Safe to call twice.
pub fn init_logging_with(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder().with_env_filter(env_filter).with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

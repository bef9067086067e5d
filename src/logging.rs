//! tracing-subscriber setup.
//!
//! The library itself only emits `tracing` events. Binaries call [`init`]
//! once at startup; `RUST_LOG` overrides the configured level.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogSettings;
use crate::error::Error;

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`Error::Logging`] when the level directive does not parse or a
/// global subscriber is already installed.
pub fn init(settings: &LogSettings) -> Result<(), Error> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level).map_err(|e| Error::Logging(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_level_directive_is_rejected() {
        // RUST_LOG would bypass the configured level
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let settings = LogSettings { level: "info,switchboard=loudest".to_owned(), json: false };
        assert!(matches!(init(&settings), Err(Error::Logging(_))));
    }
}

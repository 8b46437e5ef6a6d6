//! Logger setup for the binary.

use anyhow::{anyhow, Result};
use gunsmith_manifest::LoggingConfig;
use twyg::{LogLevel, OptsBuilder};

/// Map a config level name to a twyg level. Unknown names fall back to info.
#[must_use]
pub fn level_from_name(name: &str) -> LogLevel {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => LogLevel::Trace,
        "debug" => LogLevel::Debug,
        "warn" | "warning" => LogLevel::Warn,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

/// Install the global logger from the `[logging]` section.
///
/// Must be called once, before anything logs.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let opts = OptsBuilder::new()
        .coloured(config.coloured)
        .level(level_from_name(&config.level))
        .report_caller(config.report_caller)
        .build()
        .map_err(|e| anyhow!("Invalid logging options: {e:?}"))?;
    twyg::setup(opts).map_err(|e| anyhow!("Could not set up logger: {e:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_name() {
        assert!(matches!(level_from_name("DEBUG"), LogLevel::Debug));
        assert!(matches!(level_from_name("warning"), LogLevel::Warn));
        assert!(matches!(level_from_name("loud"), LogLevel::Info));
    }
}

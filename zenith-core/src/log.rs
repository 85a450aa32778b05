pub use log::{trace, debug, info, warn, error, LevelFilter};

/// Install the global logger. `RUST_LOG` still overrides `level` per module.
pub fn initialize(level: LevelFilter) -> Result<(), anyhow::Error> {
    env_logger::builder()
        .filter_level(level)
        .filter_module("puffin_http", LevelFilter::Warn)
        .format_timestamp_millis()
        .parse_default_env()
        .try_init()?;

    Ok(())
}

use std::sync::Once;

use log::LevelFilter;

/// Logger settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. `"warn,tessera_engine=debug"`.
    /// Falls back to `RUST_LOG`, then `info`.
    pub filter: Option<String>,

    /// Level for driver debug output (target `gl`). Applied after `filter`,
    /// so it wins for that target.
    pub driver_level: Option<LevelFilter>,

    pub write_style: env_logger::WriteStyle,

    /// Millisecond timestamps on each line.
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            driver_level: None,
            write_style: env_logger::WriteStyle::Auto,
            timestamps: false,
        }
    }
}

impl LoggingConfig {
    /// Filter directives after applying the fallbacks.
    fn directives(&self, env: Option<String>) -> String {
        let base = self
            .filter
            .clone()
            .or(env)
            .unwrap_or_else(|| "info".to_string());
        match self.driver_level {
            Some(level) => format!("{base},gl={}", level.as_str().to_ascii_lowercase()),
            None => base,
        }
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the `log` backend. Only the first call has an
/// effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let directives = config.directives(std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&directives);
        builder.write_style(config.write_style);
        builder.format_target(true);
        if config.timestamps {
            builder.format_timestamp_millis();
        } else {
            builder.format_timestamp(None);
        }

        if let Err(e) = builder.try_init() {
            // The host installed its own logger; keep it.
            eprintln!("tessera: logger already installed ({e})");
            return;
        }

        log::debug!("logging initialized with `{directives}`");
    });
}

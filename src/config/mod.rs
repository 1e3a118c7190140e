mod settings;

use config::{Config, ConfigError, Environment, File};

use crate::config::settings::PartialSettings;

pub use settings::{ListingSettings, LoggingSettings, RelaySettings, ServerSettings, Settings};

const DEFAULT_CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "AGRIRELAY";

/// Loads `config/default.*` (if present) and `AGRIRELAY_*` environment
/// variables, merged over the default settings.
///
/// Nested keys use a double underscore, e.g. `AGRIRELAY_SERVER__PORT=9000`.
pub fn load_config() -> Result<Settings, ConfigError> {
    load(DEFAULT_CONFIG_FILE, false)
}

/// Like [`load_config`] but reads the given file, which must exist.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    load(path, true)
}

fn load(path: &str, required: bool) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}

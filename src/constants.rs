// -
// Configuration loading

/// Environment variable naming the optional override config file
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Prefix for environment variable overrides (e.g. `WATCH__CONNECTION__CONNECT_TIMEOUT_IN_MS`)
pub(crate) const ENV_PREFIX: &str = "WATCH";

/// Separator between nested keys in environment variable overrides
pub(crate) const ENV_SEPARATOR: &str = "__";

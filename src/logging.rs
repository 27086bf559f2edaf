// Logging: tracing-subscriber writing to stderr, filtered by RUST_LOG or,
// when that is unset, by the verbose setting of the loaded configuration.

use tracing_subscriber::EnvFilter;

/// Filter directives used when RUST_LOG is not set. Verbose mode opens up
/// `debug`, which is where statements and their parameters are traced.
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    // The driver logs every protocol message at debug.
    format!("{},tokio_postgres=info,postgres=info", level)
}

pub fn build_env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

pub fn init(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(verbose))
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DbConfig, Overrides};

    #[test]
    fn test_default_directives() {
        assert!(default_directives(false).starts_with("info,"));
        assert!(default_directives(true).starts_with("debug,"));
    }

    #[test]
    fn test_verbose_from_config_file_enables_debug() {
        let config = DbConfig::from_toml("verbose = true").unwrap().apply(Overrides::default());
        assert!(config.verbose);
        assert!(default_directives(config.verbose).starts_with("debug,"));
    }
}

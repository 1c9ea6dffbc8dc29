//! Logging helpers
//!
//! Sets up `env_logger` behind the `log` facade.

/// Initialise the logger
///
/// `RUST_LOG` wins over `level` when it is set. Calling this more than once is harmless;
/// later calls leave the first logger in place.
///
/// # Parameters
///
/// * `level` - default filter, e.g. `info` or `config_courier=debug`
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_twice() {
        init_logger("debug");
        init_logger("info");
    }
}

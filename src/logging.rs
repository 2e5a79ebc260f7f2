use std::env;

/// Initialize logging.
///
/// `RUST_LOG` is read but never written; the library may be loaded into a
/// host whose other threads read the environment.
pub fn init() {
    let _ = pretty_env_logger::formatted_timed_builder()
        .parse_filters(&filters())
        .try_init();
}

fn filters() -> String {
    env::var("RUST_LOG").unwrap_or_else(|_| default_filters().into())
}

fn default_filters() -> &'static str {
    if cfg!(debug_assertions) {
        "perf_monitor=debug"
    } else {
        "perf_monitor=info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_leaves_environment_untouched() {
        let before = env::var_os("RUST_LOG");
        init();
        init();
        assert_eq!(env::var_os("RUST_LOG"), before);
    }

    #[test]
    fn default_targets_this_crate() {
        assert!(default_filters().starts_with("perf_monitor="));
    }
}

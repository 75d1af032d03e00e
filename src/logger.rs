use tracing_subscriber::{EnvFilter, fmt};

/// Initialise the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` with `debug_mode`.
pub fn init_logger(debug_mode: bool) {
    let default_level = if debug_mode { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(debug_mode)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::debug!("Logger initialized");
}

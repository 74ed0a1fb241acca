use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Install the global logger. All records go to stderr, stdout is reserved for command scripts.
///
/// # Arguments
///
/// * `verbosity`: number of `-v` flags, `RUST_LOG` takes precedence when set
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .parse_env(Env::default())
        .target(Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false);

    if builder.try_init().is_err() {
        log::debug!(target: "bridge", "logger already installed");
    }
}

//! engrave CLI library
//!
//! Command implementations behind the `engrave` binary.
//!
//! # Modules
//!
//! - [`cmd`] - command implementations (build, check)

pub mod cmd;

pub use engrave_core::Config;
pub use engrave_generator::{BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// `verbose` maps 0 to WARN, 1 to INFO, 2 to DEBUG and anything higher to
/// TRACE. `RUST_LOG` directives are honoured as well.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

//! Demo programs for the `clop` option dispatcher.
//!
//! `clop-demo` parses options first and treats the rest as arguments,
//! `clop-interleaved` resumes the scan after every positional argument.

pub mod arguments;
pub mod error;

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `RUST_LOG`, `warn` when unset.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

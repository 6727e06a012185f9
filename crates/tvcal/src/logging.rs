use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter directive for a `-v` count when `RUST_LOG` is unset
pub fn default_directive(verbosity: u8) -> &'static str {
  match verbosity {
    0 => "warn",
    1 => "tvcal=info,warn",
    _ => "tvcal=debug,info",
  }
}

/// Install the global subscriber. Diagnostics go to stderr so stdout stays
/// clean for command output.
pub fn init_logging(verbosity: u8) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(filter)
    .init();
}

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once per test binary. `RUST_LOG` narrows it down.
pub fn init() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("composer=trace")))
		.with_test_writer()
		.try_init();
}

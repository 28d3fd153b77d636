//! Tracing setup for embedders

use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, with this crate at `info` unless overridden
pub fn filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env().add_directive("code_widget=info".parse()?))
}

/// Install a fmt subscriber using [`filter`]. Safe to call more than once.
pub fn init() -> anyhow::Result<()> {
    let filter = filter()?;

    // A second call finds a subscriber already installed; that is fine.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    Ok(())
}

use std::io::Write;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn log_line<W: Write>(log: Option<&mut W>, message: &str) -> Result<()> {
    info!("{message}");
    if let Some(log) = log {
        writeln!(log, "{message}")?;
    }
    Ok(())
}

pub fn warn_line<W: Write>(log: Option<&mut W>, message: &str) -> Result<()> {
    warn!("{message}");
    if let Some(log) = log {
        writeln!(log, "{message}")?;
    }
    Ok(())
}

//! vnmacro - builds the chart JSON documents for the Vietnam macroeconomy site.
//!
//! Usage: `vnmacro [CONFIG.json]`

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;
use vnmacro::{telemetry, SiteConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = telemetry::init_tracing();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => SiteConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SiteConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    info!(
        data_dir = %config.data_dir.display(),
        out_dir = %config.out_dir.display(),
        "startup"
    );

    let report = vnmacro::run(&config).await;
    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "done"
    );

    if report.written.is_empty() && !report.failed.is_empty() {
        bail!("every chart failed");
    }
    Ok(())
}

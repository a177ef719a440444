//! Pull command - fetch a chart from a registry

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use chartman_helm::HelmDriver;

/// Run the pull command
pub async fn run(
    driver: &HelmDriver,
    chart: &str,
    version: &str,
    destination: Option<&Path>,
) -> Result<()> {
    match destination {
        Some(folder) => driver.save_chart(chart, version, folder).await,
        None => driver.pull_chart(chart, version).await,
    }
    .into_diagnostic()?;

    println!("Pulled {} {}", chart, version);
    Ok(())
}

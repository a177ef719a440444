//! Show-values command - print the default values of a chart

use std::io::Write;

use miette::{IntoDiagnostic, Result};

use chartman_helm::HelmDriver;

/// Run the show-values command
pub async fn run(driver: &HelmDriver, chart: &str, version: &str) -> Result<()> {
    let values = driver
        .show_values(chart, version)
        .await
        .into_diagnostic()?;
    std::io::stdout().write_all(&values).into_diagnostic()?;
    Ok(())
}

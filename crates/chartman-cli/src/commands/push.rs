//! Push command - publish a packaged chart archive

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use chartman_helm::HelmDriver;

/// Run the push command
pub async fn run(driver: &HelmDriver, chart: &Path, registry: &str) -> Result<()> {
    driver
        .push_chart(&chart.display().to_string(), registry)
        .await
        .into_diagnostic()?;
    println!("Pushed {} to {}", chart.display(), registry);
    Ok(())
}

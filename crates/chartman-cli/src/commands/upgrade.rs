//! Upgrade command - upgrade an existing release and wait for readiness

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use chartman_helm::HelmDriver;

/// Run the upgrade command
pub async fn run(
    driver: &HelmDriver,
    name: &str,
    chart: &str,
    version: &str,
    kubeconfig: &Path,
    values: &Path,
) -> Result<()> {
    driver
        .upgrade_chart_with_values_file(name, chart, version, kubeconfig, values, &[])
        .await
        .into_diagnostic()?;

    println!("Release {} upgraded to {}", name, version);
    Ok(())
}

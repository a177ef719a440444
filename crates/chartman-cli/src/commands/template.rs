//! Template command - render a chart locally

use std::io::Write;
use std::path::Path;

use miette::{IntoDiagnostic, Result};

use chartman_helm::HelmDriver;

/// Run the template command
pub async fn run(
    driver: &HelmDriver,
    chart: &str,
    version: &str,
    namespace: &str,
    values: Option<&Path>,
    kube_version: &str,
) -> Result<()> {
    let payload: serde_yaml::Value = match values {
        Some(path) => {
            let content = std::fs::read_to_string(path).into_diagnostic()?;
            serde_yaml::from_str(&content).into_diagnostic()?
        }
        None => serde_yaml::Value::Mapping(Default::default()),
    };

    let rendered = driver
        .template(chart, version, namespace, &payload, kube_version)
        .await
        .into_diagnostic()?;

    std::io::stdout().write_all(&rendered).into_diagnostic()?;
    Ok(())
}

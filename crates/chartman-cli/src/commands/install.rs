//! Install command - install or upgrade a release

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};

use chartman_helm::{HelmDriver, InstallSpec};

/// Run the install command
#[allow(clippy::too_many_arguments)]
pub async fn run(
    driver: &HelmDriver,
    name: String,
    chart: String,
    version: String,
    kubeconfig: Option<PathBuf>,
    namespace: Option<String>,
    values: Option<PathBuf>,
    skip_crds: bool,
    set: Vec<String>,
) -> Result<()> {
    let spec = InstallSpec {
        name,
        chart,
        version,
        kubeconfig,
        namespace,
        values_file: values,
        skip_crds,
        set,
    };

    driver.install_chart(&spec).await.into_diagnostic()?;

    println!("Release {} installed", spec.name);
    Ok(())
}

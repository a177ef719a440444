//! Delete command - uninstall a release

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use chartman_helm::HelmDriver;

/// Run the delete command
pub async fn run(
    driver: &HelmDriver,
    name: &str,
    kubeconfig: &Path,
    namespace: Option<&str>,
) -> Result<()> {
    driver
        .delete(kubeconfig, name, namespace)
        .await
        .into_diagnostic()?;

    println!("Release {} deleted", name);
    Ok(())
}

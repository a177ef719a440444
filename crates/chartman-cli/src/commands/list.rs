//! List command - list installed releases

use std::path::Path;

use console::style;
use miette::{IntoDiagnostic, Result};

use chartman_helm::HelmDriver;

/// Run the list command
pub async fn run(driver: &HelmDriver, kubeconfig: &Path, output_json: bool) -> Result<()> {
    let releases = driver.list_charts(kubeconfig).await.into_diagnostic()?;

    if output_json {
        let json = serde_json::to_string_pretty(&releases).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    if releases.is_empty() {
        println!("No releases found");
        return Ok(());
    }

    println!("{}", style("NAME").bold());
    for release in releases {
        println!("{}", release);
    }

    Ok(())
}

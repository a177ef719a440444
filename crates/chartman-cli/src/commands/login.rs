//! Login command - authenticate against a chart registry

use std::io::Read;

use miette::{IntoDiagnostic, Result};

use chartman_helm::HelmDriver;

/// Run the login command. The password comes in on stdin so it never lands
/// in argv or shell history.
pub async fn run(driver: &HelmDriver, registry: &str, username: &str) -> Result<()> {
    let mut password = String::new();
    std::io::stdin()
        .read_to_string(&mut password)
        .into_diagnostic()?;
    let password = password.trim_end_matches(['\r', '\n']);

    driver
        .registry_login(registry, username, password)
        .await
        .into_diagnostic()?;

    println!("Login succeeded");
    Ok(())
}

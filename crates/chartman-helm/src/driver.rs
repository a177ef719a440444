//! Chart lifecycle driver
//!
//! Builds a deterministic argument list per operation, applies registry
//! mirror rewriting and the insecure flag, and executes through a
//! [`CommandRunner`]. One invocation per call; no retries, no background
//! work, no state retained between calls.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use chartman_core::RegistryMirror;
use chartman_exec::{CommandRunner, Invocation};

use crate::error::{HelmError, Result};

const HELM_PATH: &str = "helm";
const INSECURE_SKIP_VERIFY_FLAG: &str = "--insecure-skip-tls-verify";
const INSECURE_LOGIN_FLAG: &str = "--insecure";

/// Required for OCI registry operations on older helm releases.
const OCI_ENV_VAR: &str = "HELM_EXPERIMENTAL_OCI";

/// Driver configuration.
///
/// The env mapping is ordered and only ever extended, never cleared; it is
/// passed whole to every child process.
#[derive(Debug, Clone)]
pub struct HelmConfig {
    pub env: BTreeMap<String, String>,
    pub registry_mirror: Option<RegistryMirror>,
    pub insecure: bool,
}

impl Default for HelmConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert(OCI_ENV_VAR.to_string(), "1".to_string());
        Self {
            env,
            registry_mirror: None,
            insecure: false,
        }
    }
}

/// A single configuration option.
///
/// Options are applied in the order given: env options merge into the
/// existing mapping, mirror and insecure options overwrite.
#[derive(Debug, Clone)]
pub enum HelmOpt {
    /// Route every externally sourced chart reference through a mirror.
    RegistryMirror(RegistryMirror),
    /// Skip TLS certificate verification on every invocation.
    Insecure,
    /// Merge additional environment variables into the child process env.
    Env(BTreeMap<String, String>),
}

impl HelmOpt {
    fn apply(&self, config: &mut HelmConfig) {
        match self {
            HelmOpt::RegistryMirror(mirror) => config.registry_mirror = Some(mirror.clone()),
            HelmOpt::Insecure => config.insecure = true,
            HelmOpt::Env(extra) => config
                .env
                .extend(extra.iter().map(|(k, v)| (k.clone(), v.clone()))),
        }
    }
}

/// Inputs for [`HelmDriver::install_chart`].
#[derive(Debug, Clone, Default)]
pub struct InstallSpec {
    /// Release name
    pub name: String,
    /// Chart reference (rewritten through the mirror when one is set)
    pub chart: String,
    /// Chart version
    pub version: String,
    /// Kubeconfig path; omitted from the invocation when `None`
    pub kubeconfig: Option<PathBuf>,
    /// Target namespace; when set the namespace is also created
    pub namespace: Option<String>,
    /// Values file passed with `-f`
    pub values_file: Option<PathBuf>,
    /// Skip installing CRDs from the chart
    pub skip_crds: bool,
    /// Inline `--set key=value` overrides, applied in order
    pub set: Vec<String>,
}

impl InstallSpec {
    pub fn new(
        name: impl Into<String>,
        chart: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            chart: chart.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_values_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.values_file = Some(path.into());
        self
    }

    pub fn skip_crds(mut self) -> Self {
        self.skip_crds = true;
        self
    }

    /// Add an inline `key=value` override.
    pub fn set(mut self, pair: impl Into<String>) -> Self {
        self.set.push(pair.into());
        self
    }
}

/// Drives the external helm binary.
///
/// Construct once per execution context; all operations take `&self` and
/// the driver is safe to share across tasks. Cancellation is cooperative:
/// dropping an operation future kills the child process.
pub struct HelmDriver {
    runner: Arc<dyn CommandRunner>,
    config: HelmConfig,
}

impl HelmDriver {
    /// Create a driver with default configuration: TLS verification on, no
    /// mirror, and a base env containing the OCI feature toggle.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            config: HelmConfig::default(),
        }
    }

    /// Apply configuration options in order.
    pub fn with_opts(mut self, opts: impl IntoIterator<Item = HelmOpt>) -> Self {
        for opt in opts {
            opt.apply(&mut self.config);
        }
        self
    }

    /// Render a chart with the given values payload.
    ///
    /// The payload is serialized to YAML and fed on stdin; serialization
    /// failure is returned before the external tool is invoked.
    pub async fn template<V: Serialize>(
        &self,
        oci_uri: &str,
        version: &str,
        namespace: &str,
        values: &V,
        kube_version: &str,
    ) -> Result<Vec<u8>> {
        let values_yaml = serde_yaml::to_string(values)?;

        let params = vec![
            "template".to_string(),
            rewrite(&self.config, oci_uri),
            "--version".to_string(),
            version.to_string(),
            "--namespace".to_string(),
            namespace.to_string(),
            "--kube-version".to_string(),
            kube_version.to_string(),
            "-f".to_string(),
            "-".to_string(),
        ];

        self.exec(&self.config, params, Some(values_yaml.into_bytes()))
            .await
    }

    /// Pull a chart into the local cache.
    pub async fn pull_chart(&self, oci_uri: &str, version: &str) -> Result<()> {
        let params = vec![
            "pull".to_string(),
            rewrite(&self.config, oci_uri),
            "--version".to_string(),
            version.to_string(),
        ];
        self.exec(&self.config, params, None).await?;
        Ok(())
    }

    /// Get the default values of a chart.
    pub async fn show_values(&self, oci_uri: &str, version: &str) -> Result<Vec<u8>> {
        let params = vec![
            "show".to_string(),
            "values".to_string(),
            rewrite(&self.config, oci_uri),
            "--version".to_string(),
            version.to_string(),
        ];
        self.exec(&self.config, params, None).await
    }

    /// Push a packaged chart to a registry. The destination is
    /// caller-supplied and explicit, so no mirror rewrite is applied.
    pub async fn push_chart(&self, chart: &str, registry: &str) -> Result<()> {
        info!(chart = %chart, "pushing chart");
        let params = vec!["push".to_string(), chart.to_string(), registry.to_string()];
        self.exec(&self.config, params, None).await?;
        Ok(())
    }

    /// Log in to a chart registry. The password goes to the tool on stdin,
    /// never into the argument list.
    pub async fn registry_login(
        &self,
        registry: &str,
        username: &str,
        password: &str,
    ) -> Result<()> {
        info!(registry = %registry, "logging in to chart registry");
        let mut params = vec![
            "registry".to_string(),
            "login".to_string(),
            registry.to_string(),
            "--username".to_string(),
            username.to_string(),
            "--password-stdin".to_string(),
        ];
        if self.config.insecure {
            // The login subcommand has its own spelling of the flag
            params.push(INSECURE_LOGIN_FLAG.to_string());
        }
        self.exec_raw(&self.config, params, Some(password.as_bytes().to_vec()))
            .await?;
        Ok(())
    }

    /// Pull a chart into a destination folder.
    pub async fn save_chart(&self, oci_uri: &str, version: &str, folder: &Path) -> Result<()> {
        let params = vec![
            "pull".to_string(),
            rewrite(&self.config, oci_uri),
            "--version".to_string(),
            version.to_string(),
            "--destination".to_string(),
            folder.display().to_string(),
        ];
        self.exec(&self.config, params, None).await?;
        Ok(())
    }

    /// Install a release, upgrading it if it already exists.
    ///
    /// `upgrade --install` creates absent releases and upgrades existing
    /// ones, so repeated calls with the same inputs succeed where a plain
    /// install would fail.
    pub async fn install_chart_from_name(
        &self,
        oci_uri: &str,
        kubeconfig: &Path,
        name: &str,
        version: &str,
    ) -> Result<()> {
        let params = vec![
            "upgrade".to_string(),
            "--install".to_string(),
            name.to_string(),
            rewrite(&self.config, oci_uri),
            "--version".to_string(),
            version.to_string(),
            "--kubeconfig".to_string(),
            kubeconfig.display().to_string(),
        ];
        self.exec(&self.config, params, None).await?;
        Ok(())
    }

    /// Install a release with the full set of optional inputs. Optional
    /// tokens are appended only when the corresponding input is present.
    pub async fn install_chart(&self, spec: &InstallSpec) -> Result<()> {
        let mut params = vec![
            "upgrade".to_string(),
            "--install".to_string(),
            spec.name.clone(),
            rewrite(&self.config, &spec.chart),
            "--version".to_string(),
            spec.version.clone(),
        ];
        if spec.skip_crds {
            params.push("--skip-crds".to_string());
        }
        for pair in &spec.set {
            params.push("--set".to_string());
            params.push(pair.clone());
        }
        if let Some(kubeconfig) = &spec.kubeconfig {
            params.push("--kubeconfig".to_string());
            params.push(kubeconfig.display().to_string());
        }
        if let Some(namespace) = &spec.namespace {
            params.push("--create-namespace".to_string());
            params.push("--namespace".to_string());
            params.push(namespace.clone());
        }
        if let Some(values_file) = &spec.values_file {
            params.push("-f".to_string());
            params.push(values_file.display().to_string());
        }

        info!(chart = %spec.chart, version = %spec.version, "installing chart on cluster");
        self.exec(&self.config, params, None).await?;
        Ok(())
    }

    /// Install a release with a values file and block until its resources
    /// are ready. The external tool enforces its own wait timeout (5m by
    /// default).
    pub async fn install_chart_with_values_file(
        &self,
        name: &str,
        oci_uri: &str,
        version: &str,
        kubeconfig: &Path,
        values_file: &Path,
    ) -> Result<()> {
        let params = vec![
            "upgrade".to_string(),
            "--install".to_string(),
            name.to_string(),
            rewrite(&self.config, oci_uri),
            "--version".to_string(),
            version.to_string(),
            "--values".to_string(),
            values_file.display().to_string(),
            "--kubeconfig".to_string(),
            kubeconfig.display().to_string(),
            "--wait".to_string(),
        ];
        self.exec(&self.config, params, None).await?;
        Ok(())
    }

    /// Upgrade an existing release (no `--install`) with a values file and
    /// wait for readiness.
    ///
    /// Per-call `opts` apply only to this invocation; they are layered on a
    /// copy of the driver's configuration and never persisted.
    pub async fn upgrade_chart_with_values_file(
        &self,
        name: &str,
        oci_uri: &str,
        version: &str,
        kubeconfig: &Path,
        values_file: &Path,
        opts: &[HelmOpt],
    ) -> Result<()> {
        let mut config = self.config.clone();
        for opt in opts {
            opt.apply(&mut config);
        }

        let params = vec![
            "upgrade".to_string(),
            name.to_string(),
            rewrite(&config, oci_uri),
            "--version".to_string(),
            version.to_string(),
            "--values".to_string(),
            values_file.display().to_string(),
            "--kubeconfig".to_string(),
            kubeconfig.display().to_string(),
            "--wait".to_string(),
        ];
        self.exec(&config, params, None).await?;
        Ok(())
    }

    /// Remove a release.
    pub async fn delete(
        &self,
        kubeconfig: &Path,
        install_name: &str,
        namespace: Option<&str>,
    ) -> Result<()> {
        let mut params = vec![
            "delete".to_string(),
            install_name.to_string(),
            "--kubeconfig".to_string(),
            kubeconfig.display().to_string(),
        ];
        if let Some(namespace) = namespace {
            params.push("--namespace".to_string());
            params.push(namespace.to_string());
        }

        match self.exec(&self.config, params, None).await {
            Ok(_) => {
                debug!(name = %install_name, "deleted helm release");
                Ok(())
            }
            Err(HelmError::Exec(source)) => Err(HelmError::Deletion {
                release: install_name.to_string(),
                source,
            }),
            Err(other) => Err(other),
        }
    }

    /// List installed release names, one per line, empty lines dropped.
    pub async fn list_charts(&self, kubeconfig: &Path) -> Result<Vec<String>> {
        let params = vec![
            "list".to_string(),
            "-q".to_string(),
            "--kubeconfig".to_string(),
            kubeconfig.display().to_string(),
        ];
        let out = self.exec(&self.config, params, None).await?;
        let text = String::from_utf8_lossy(&out);
        Ok(text
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Append the insecure flag (always last) when configured, then run.
    async fn exec(
        &self,
        config: &HelmConfig,
        mut params: Vec<String>,
        stdin: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        if config.insecure {
            params.push(INSECURE_SKIP_VERIFY_FLAG.to_string());
        }
        self.exec_raw(config, params, stdin).await
    }

    async fn exec_raw(
        &self,
        config: &HelmConfig,
        params: Vec<String>,
        stdin: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let mut invocation = Invocation::new(HELM_PATH, params).envs(&config.env);
        if let Some(bytes) = stdin {
            invocation = invocation.stdin(bytes);
        }
        Ok(self.runner.run(invocation).await?)
    }
}

fn rewrite(config: &HelmConfig, reference: &str) -> String {
    match &config.registry_mirror {
        Some(mirror) => mirror.rewrite(reference),
        None => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartman_exec::{ExecError, RecordingRunner};

    const KUBECONFIG: &str = "/tmp/kubeconfig";

    fn driver_with(opts: Vec<HelmOpt>) -> (Arc<RecordingRunner>, HelmDriver) {
        let runner = Arc::new(RecordingRunner::new());
        let driver = HelmDriver::new(runner.clone()).with_opts(opts);
        (runner, driver)
    }

    fn mirror() -> RegistryMirror {
        RegistryMirror::new("registry.local:8443").unwrap()
    }

    /// Serialize impl that always fails, for the no-invocation property.
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(<S::Error as serde::ser::Error>::custom("not serializable"))
        }
    }

    #[tokio::test]
    async fn install_with_no_options_builds_expected_tokens() {
        let (runner, driver) = driver_with(vec![]);
        let spec = InstallSpec::new("r", "oci://x", "1.0").with_namespace("ns");

        driver.install_chart(&spec).await.unwrap();

        let call = runner.last_call().unwrap();
        assert_eq!(call.program, "helm");
        assert_eq!(
            call.args,
            vec![
                "upgrade",
                "--install",
                "r",
                "oci://x",
                "--version",
                "1.0",
                "--create-namespace",
                "--namespace",
                "ns",
            ]
        );
    }

    #[tokio::test]
    async fn install_appends_conditional_tokens_in_order() {
        let (runner, driver) = driver_with(vec![]);
        let spec = InstallSpec::new("r", "oci://x", "1.0")
            .skip_crds()
            .set("a=1")
            .set("b=2")
            .with_kubeconfig(KUBECONFIG)
            .with_namespace("ns")
            .with_values_file("/tmp/values.yaml");

        driver.install_chart(&spec).await.unwrap();

        assert_eq!(
            runner.last_call().unwrap().args,
            vec![
                "upgrade",
                "--install",
                "r",
                "oci://x",
                "--version",
                "1.0",
                "--skip-crds",
                "--set",
                "a=1",
                "--set",
                "b=2",
                "--kubeconfig",
                KUBECONFIG,
                "--create-namespace",
                "--namespace",
                "ns",
                "-f",
                "/tmp/values.yaml",
            ]
        );
    }

    #[tokio::test]
    async fn chart_references_are_rewritten_through_the_mirror() {
        let (runner, driver) = driver_with(vec![HelmOpt::RegistryMirror(mirror())]);
        let rewritten = "oci://registry.local:8443/acme/app";

        driver
            .template(
                "oci://public.ecr.aws/acme/app",
                "1.0",
                "ns",
                &serde_json::json!({}),
                "1.29",
            )
            .await
            .unwrap();
        assert_eq!(runner.last_call().unwrap().args[1], rewritten);

        driver
            .pull_chart("oci://public.ecr.aws/acme/app", "1.0")
            .await
            .unwrap();
        assert_eq!(runner.last_call().unwrap().args[1], rewritten);

        driver
            .show_values("oci://public.ecr.aws/acme/app", "1.0")
            .await
            .unwrap();
        assert_eq!(runner.last_call().unwrap().args[2], rewritten);

        driver
            .save_chart("oci://public.ecr.aws/acme/app", "1.0", Path::new("/tmp/out"))
            .await
            .unwrap();
        assert_eq!(runner.last_call().unwrap().args[1], rewritten);

        driver
            .install_chart_from_name(
                "oci://public.ecr.aws/acme/app",
                Path::new(KUBECONFIG),
                "r",
                "1.0",
            )
            .await
            .unwrap();
        assert_eq!(runner.last_call().unwrap().args[3], rewritten);

        driver
            .install_chart(&InstallSpec::new("r", "oci://public.ecr.aws/acme/app", "1.0"))
            .await
            .unwrap();
        assert_eq!(runner.last_call().unwrap().args[3], rewritten);

        driver
            .upgrade_chart_with_values_file(
                "r",
                "oci://public.ecr.aws/acme/app",
                "1.0",
                Path::new(KUBECONFIG),
                Path::new("/tmp/values.yaml"),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(runner.last_call().unwrap().args[2], rewritten);
    }

    #[tokio::test]
    async fn references_pass_through_unchanged_without_a_mirror() {
        let (runner, driver) = driver_with(vec![]);
        driver
            .pull_chart("oci://public.ecr.aws/acme/app", "1.0")
            .await
            .unwrap();
        assert_eq!(
            runner.last_call().unwrap().args[1],
            "oci://public.ecr.aws/acme/app"
        );
    }

    #[tokio::test]
    async fn push_destination_is_never_rewritten() {
        let (runner, driver) = driver_with(vec![HelmOpt::RegistryMirror(mirror())]);
        driver
            .push_chart("/tmp/app-1.0.tgz", "oci://public.ecr.aws/acme")
            .await
            .unwrap();
        assert_eq!(
            runner.last_call().unwrap().args,
            vec!["push", "/tmp/app-1.0.tgz", "oci://public.ecr.aws/acme"]
        );
    }

    #[tokio::test]
    async fn insecure_flag_is_the_final_token_of_every_invocation() {
        let (runner, driver) = driver_with(vec![HelmOpt::Insecure]);

        driver
            .template("oci://x/c", "1.0", "ns", &serde_json::json!({}), "1.29")
            .await
            .unwrap();
        driver.pull_chart("oci://x/c", "1.0").await.unwrap();
        driver.show_values("oci://x/c", "1.0").await.unwrap();
        driver.push_chart("c.tgz", "oci://x").await.unwrap();
        driver
            .save_chart("oci://x/c", "1.0", Path::new("/tmp/out"))
            .await
            .unwrap();
        driver
            .install_chart_from_name("oci://x/c", Path::new(KUBECONFIG), "r", "1.0")
            .await
            .unwrap();
        driver
            .install_chart(&InstallSpec::new("r", "oci://x/c", "1.0"))
            .await
            .unwrap();
        driver
            .install_chart_with_values_file(
                "r",
                "oci://x/c",
                "1.0",
                Path::new(KUBECONFIG),
                Path::new("/tmp/values.yaml"),
            )
            .await
            .unwrap();
        driver
            .upgrade_chart_with_values_file(
                "r",
                "oci://x/c",
                "1.0",
                Path::new(KUBECONFIG),
                Path::new("/tmp/values.yaml"),
                &[],
            )
            .await
            .unwrap();
        driver
            .delete(Path::new(KUBECONFIG), "r", Some("ns"))
            .await
            .unwrap();
        driver.list_charts(Path::new(KUBECONFIG)).await.unwrap();

        for call in runner.calls() {
            assert_eq!(
                call.args.last().map(String::as_str),
                Some("--insecure-skip-tls-verify"),
                "missing insecure flag on: {:?}",
                call.args
            );
        }
    }

    #[tokio::test]
    async fn insecure_flag_never_appears_by_default() {
        let (runner, driver) = driver_with(vec![]);
        driver.pull_chart("oci://x/c", "1.0").await.unwrap();
        driver.list_charts(Path::new(KUBECONFIG)).await.unwrap();

        for call in runner.calls() {
            assert!(
                !call.args.iter().any(|a| a == "--insecure-skip-tls-verify"),
                "unexpected insecure flag on: {:?}",
                call.args
            );
        }
    }

    #[tokio::test]
    async fn registry_login_uses_the_login_insecure_spelling() {
        let (runner, driver) = driver_with(vec![HelmOpt::Insecure]);
        driver
            .registry_login("registry.local", "user", "s3cret")
            .await
            .unwrap();
        assert_eq!(
            runner.last_call().unwrap().args.last().map(String::as_str),
            Some("--insecure")
        );
    }

    #[tokio::test]
    async fn registry_login_keeps_the_password_off_the_command_line() {
        let (runner, driver) = driver_with(vec![]);
        driver
            .registry_login("registry.local", "user", "s3cret")
            .await
            .unwrap();

        let call = runner.last_call().unwrap();
        assert!(!call.args.iter().any(|a| a.contains("s3cret")));
        assert!(call.args.iter().any(|a| a == "--password-stdin"));
        assert_eq!(call.stdin.as_deref(), Some(b"s3cret".as_ref()));
    }

    #[tokio::test]
    async fn template_feeds_serialized_values_on_stdin() {
        let (runner, driver) = driver_with(vec![]);
        driver
            .template(
                "oci://x/c",
                "1.0",
                "ns",
                &serde_json::json!({"replicas": 2}),
                "1.29",
            )
            .await
            .unwrap();

        let call = runner.last_call().unwrap();
        assert_eq!(
            call.args,
            vec![
                "template",
                "oci://x/c",
                "--version",
                "1.0",
                "--namespace",
                "ns",
                "--kube-version",
                "1.29",
                "-f",
                "-",
            ]
        );
        assert_eq!(call.stdin.as_deref(), Some(b"replicas: 2\n".as_ref()));
    }

    #[tokio::test]
    async fn template_serialization_failure_never_invokes_the_tool() {
        let (runner, driver) = driver_with(vec![]);
        let err = driver
            .template("oci://x/c", "1.0", "ns", &Unserializable, "1.29")
            .await
            .unwrap_err();

        assert!(matches!(err, HelmError::Serialization(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn install_entry_points_are_idempotent_upgrade_installs() {
        let (runner, driver) = driver_with(vec![]);
        for _ in 0..2 {
            driver
                .install_chart_from_name("oci://x/c", Path::new(KUBECONFIG), "r", "1.0")
                .await
                .unwrap();
            driver
                .install_chart(&InstallSpec::new("r", "oci://x/c", "1.0"))
                .await
                .unwrap();
        }
        for call in runner.calls() {
            assert_eq!(&call.args[..2], ["upgrade", "--install"]);
        }
    }

    #[tokio::test]
    async fn upgrade_omits_install_and_waits() {
        let (runner, driver) = driver_with(vec![]);
        driver
            .upgrade_chart_with_values_file(
                "r",
                "oci://x/c",
                "1.0",
                Path::new(KUBECONFIG),
                Path::new("/tmp/values.yaml"),
                &[],
            )
            .await
            .unwrap();

        assert_eq!(
            runner.last_call().unwrap().args,
            vec![
                "upgrade",
                "r",
                "oci://x/c",
                "--version",
                "1.0",
                "--values",
                "/tmp/values.yaml",
                "--kubeconfig",
                KUBECONFIG,
                "--wait",
            ]
        );
    }

    #[tokio::test]
    async fn upgrade_per_call_options_do_not_persist() {
        let (runner, driver) = driver_with(vec![]);

        driver
            .upgrade_chart_with_values_file(
                "r",
                "oci://x/c",
                "1.0",
                Path::new(KUBECONFIG),
                Path::new("/tmp/values.yaml"),
                &[HelmOpt::Insecure],
            )
            .await
            .unwrap();
        driver.pull_chart("oci://x/c", "1.0").await.unwrap();

        let calls = runner.calls();
        assert_eq!(
            calls[0].args.last().map(String::as_str),
            Some("--insecure-skip-tls-verify")
        );
        assert!(!calls[1].args.iter().any(|a| a == "--insecure-skip-tls-verify"));
    }

    #[tokio::test]
    async fn list_charts_splits_lines_and_drops_empty_segments() {
        let (runner, driver) = driver_with(vec![]);
        runner.respond_ok(b"a\nb\n\nc\n".to_vec());

        let charts = driver.list_charts(Path::new(KUBECONFIG)).await.unwrap();
        assert_eq!(charts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn delete_wraps_failures_with_the_release_name() {
        let (runner, driver) = driver_with(vec![]);
        runner.respond_err(ExecError::NonZeroExit {
            program: "helm".to_string(),
            code: 1,
            stderr: "release not loaded".to_string(),
        });

        let err = driver
            .delete(Path::new(KUBECONFIG), "r", None)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("deleting helm release 'r'"));
        assert!(matches!(err, HelmError::Deletion { .. }));
        match err {
            HelmError::Deletion { source, .. } => {
                assert!(source.to_string().contains("release not loaded"))
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn env_options_merge_and_reach_the_invocation() {
        let mut extra = BTreeMap::new();
        extra.insert("HELM_CACHE_HOME".to_string(), "/tmp/cache".to_string());
        let mut more = BTreeMap::new();
        more.insert("HELM_DEBUG".to_string(), "1".to_string());

        let (runner, driver) =
            driver_with(vec![HelmOpt::Env(extra), HelmOpt::Env(more)]);
        driver.pull_chart("oci://x/c", "1.0").await.unwrap();

        let env = runner.last_call().unwrap().env;
        // Merged, not replaced: the default toggle survives
        assert_eq!(env.get("HELM_EXPERIMENTAL_OCI").map(String::as_str), Some("1"));
        assert_eq!(env.get("HELM_CACHE_HOME").map(String::as_str), Some("/tmp/cache"));
        assert_eq!(env.get("HELM_DEBUG").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn exec_failures_pass_through_verbatim() {
        let (runner, driver) = driver_with(vec![]);
        runner.respond_err(ExecError::NonZeroExit {
            program: "helm".to_string(),
            code: 1,
            stderr: "chart not found".to_string(),
        });

        let err = driver.pull_chart("oci://x/c", "1.0").await.unwrap_err();
        match err {
            HelmError::Exec(ExecError::NonZeroExit { stderr, .. }) => {
                assert_eq!(stderr, "chart not found")
            }
            other => panic!("expected passthrough exec error, got {other:?}"),
        }
    }
}

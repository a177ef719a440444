//! Chartman CLI - chart lifecycle operations through the helm binary

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use chartman_core::RegistryMirror;
use chartman_exec::ProcessRunner;
use chartman_helm::{HelmDriver, HelmOpt};

mod commands;
mod util;

#[derive(Parser)]
#[command(name = "chartman")]
#[command(version)]
#[command(about = "Chart lifecycle operations through the helm binary", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Skip TLS certificate verification for registry and cluster access
    #[arg(long, global = true)]
    insecure: bool,

    /// Registry mirror endpoint (host[:port]) to route chart pulls through
    #[arg(long, global = true)]
    mirror: Option<String>,

    /// Extra environment variables for the helm process
    #[arg(long = "env", global = true, value_name = "KEY=VALUE")]
    env: Vec<String>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a chart with a values file
    Template {
        /// Chart reference (e.g. oci://registry/repo/chart)
        chart: String,

        /// Chart version
        #[arg(long)]
        version: String,

        /// Target namespace
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Values file fed to the renderer
        #[arg(short = 'f', long = "values")]
        values: Option<PathBuf>,

        /// Kubernetes version to render against
        #[arg(long)]
        kube_version: String,
    },

    /// Pull a chart, optionally into a destination folder
    Pull {
        chart: String,

        #[arg(long)]
        version: String,

        /// Save the chart into this folder instead of the local cache
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },

    /// Print the default values of a chart
    ShowValues {
        chart: String,

        #[arg(long)]
        version: String,
    },

    /// Push a packaged chart archive to a registry
    Push {
        /// Path to the packaged chart archive
        chart: PathBuf,

        /// Destination registry (explicit; never mirrored)
        registry: String,
    },

    /// Log in to a chart registry (password read from stdin)
    Login {
        registry: String,

        #[arg(short, long)]
        username: String,
    },

    /// Install a release, upgrading it if it already exists
    Install {
        /// Release name
        name: String,

        /// Chart reference
        chart: String,

        #[arg(long)]
        version: String,

        #[arg(long)]
        kubeconfig: Option<PathBuf>,

        #[arg(short, long)]
        namespace: Option<String>,

        #[arg(short = 'f', long = "values")]
        values: Option<PathBuf>,

        /// Skip installing CRDs from the chart
        #[arg(long)]
        skip_crds: bool,

        /// Inline value overrides (key=value)
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Upgrade an existing release with a values file and wait for readiness
    Upgrade {
        name: String,

        chart: String,

        #[arg(long)]
        version: String,

        #[arg(long)]
        kubeconfig: PathBuf,

        #[arg(short = 'f', long = "values")]
        values: PathBuf,
    },

    /// Uninstall a release
    Delete {
        name: String,

        #[arg(long)]
        kubeconfig: PathBuf,

        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// List installed releases
    List {
        #[arg(long)]
        kubeconfig: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let driver = build_driver(&cli)?;

    match cli.command {
        Commands::Template {
            chart,
            version,
            namespace,
            values,
            kube_version,
        } => {
            commands::template::run(
                &driver,
                &chart,
                &version,
                &namespace,
                values.as_deref(),
                &kube_version,
            )
            .await
        }
        Commands::Pull {
            chart,
            version,
            destination,
        } => commands::pull::run(&driver, &chart, &version, destination.as_deref()).await,
        Commands::ShowValues { chart, version } => {
            commands::show::run(&driver, &chart, &version).await
        }
        Commands::Push { chart, registry } => {
            commands::push::run(&driver, &chart, &registry).await
        }
        Commands::Login { registry, username } => {
            commands::login::run(&driver, &registry, &username).await
        }
        Commands::Install {
            name,
            chart,
            version,
            kubeconfig,
            namespace,
            values,
            skip_crds,
            set,
        } => {
            commands::install::run(
                &driver, name, chart, version, kubeconfig, namespace, values, skip_crds, set,
            )
            .await
        }
        Commands::Upgrade {
            name,
            chart,
            version,
            kubeconfig,
            values,
        } => {
            commands::upgrade::run(&driver, &name, &chart, &version, &kubeconfig, &values).await
        }
        Commands::Delete {
            name,
            kubeconfig,
            namespace,
        } => commands::delete::run(&driver, &name, &kubeconfig, namespace.as_deref()).await,
        Commands::List { kubeconfig, json } => {
            commands::list::run(&driver, &kubeconfig, json).await
        }
    }
}

/// Translate global flags into driver options.
fn build_driver(cli: &Cli) -> Result<HelmDriver> {
    let mut opts = Vec::new();
    if let Some(endpoint) = &cli.mirror {
        let mirror = RegistryMirror::new(endpoint.clone()).into_diagnostic()?;
        opts.push(HelmOpt::RegistryMirror(mirror));
    }
    if cli.insecure {
        opts.push(HelmOpt::Insecure);
    }
    if !cli.env.is_empty() {
        opts.push(HelmOpt::Env(util::parse_env_pairs(&cli.env)?));
    }
    Ok(HelmDriver::new(Arc::new(ProcessRunner)).with_opts(opts))
}

fn init_tracing(debug: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if debug { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

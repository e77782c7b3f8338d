//! Deckhand CLI - Helm and kubectl in containers, for CI pipelines

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod error;
mod exit_codes;
mod logging;

use commands::Settings;
use error::CliError;
use tracing::info;

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(author = "Deckhand Contributors")]
#[command(version)]
#[command(about = "Run Helm and kubectl inside containers from CI pipelines", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ~/.config/deckhand/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Docker-compatible binary used to run containers
    #[arg(long, global = true, env = "DECKHAND_DOCKER")]
    docker: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Helm chart operations
    Helm {
        #[command(subcommand)]
        command: HelmCommands,
    },

    /// kubectl operations
    Kubectl {
        #[command(subcommand)]
        command: KubectlCommands,
    },
}

#[derive(Subcommand)]
enum HelmCommands {
    /// Render a chart to a single manifest file
    Template {
        /// Chart directory containing Chart.yaml
        chart: PathBuf,

        /// Values file inside the chart directory (repeatable)
        #[arg(short = 'f', long = "values")]
        values: Vec<String>,

        /// Values file from outside the chart; overrides in-chart values (repeatable)
        #[arg(long = "values-file")]
        values_files: Vec<PathBuf>,

        /// Custom image with helm installed
        #[arg(long)]
        base_image: Option<String>,

        /// Write <name>-<version>.yaml here instead of printing it
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum KubectlCommands {
    /// Run a kubectl subcommand, e.g. `deckhand kubectl exec -- get pods -n default`
    Exec {
        /// Kubeconfig file to mount [default: first existing file listed in $KUBECONFIG]
        #[arg(long)]
        kubeconfig: Option<PathBuf>,

        /// kubectl version (image tag)
        #[arg(long = "kubectl-version")]
        kubectl_version: Option<String>,

        /// Authenticate against this EKS cluster using AWS_* credentials (ignores --kubeconfig)
        #[arg(long, requires = "eks_region")]
        eks_cluster: Option<String>,

        /// Region of the EKS cluster
        #[arg(long, requires = "eks_cluster")]
        eks_region: Option<String>,

        /// Arguments passed to kubectl verbatim
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init(cli.debug);

    let settings = Settings {
        config: cli.config,
        docker: cli.docker,
    };

    // The losing branch is dropped, which removes any container it started.
    let result = tokio::select! {
        result = run(cli.command, &settings) => result,
        signal = shutdown_signal() => {
            info!(signal, "Shutting down");
            Err(CliError::Interrupted { signal })
        }
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(command: Commands, settings: &Settings) -> error::Result<()> {
    match command {
        Commands::Helm {
            command:
                HelmCommands::Template {
                    chart,
                    values,
                    values_files,
                    base_image,
                    output_dir,
                },
        } => {
            commands::helm::template(
                settings,
                &chart,
                &values,
                &values_files,
                base_image.as_deref(),
                output_dir.as_deref(),
            )
            .await
        }

        Commands::Kubectl {
            command:
                KubectlCommands::Exec {
                    kubeconfig,
                    kubectl_version,
                    eks_cluster,
                    eks_region,
                    args,
                },
        } => {
            let eks = eks_cluster.zip(eks_region);
            commands::kubectl::exec(
                settings,
                kubeconfig.as_deref(),
                kubectl_version.as_deref(),
                eks,
                &args,
            )
            .await
        }
    }
}

/// Resolve with the name of the first SIGINT or SIGTERM received
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

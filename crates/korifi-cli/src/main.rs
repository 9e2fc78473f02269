//! Korifi CLI - print platform information of a Korifi installation
//!
//! Authenticates with the client certificate of a kubeconfig user and calls
//! `GET /v3/info`.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use korifi_client::KorifiClient;
use korifi_common::kubeconfig;
use korifi_common::{ClientConfig, DEFAULT_API_URL, DEFAULT_USER, KubeConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig user whose client certificate authenticates requests
    /// (defaults to the current context's user, then kind-korifi)
    #[arg(long)]
    user: Option<String>,

    /// Base URL of the Korifi API
    #[arg(long, env = "KORIFI_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// PEM file with additional root certificates to trust
    #[arg(long)]
    cacert: Option<PathBuf>,

    /// Do not verify the server certificate (development clusters only)
    #[arg(long)]
    insecure_skip_tls_verify: bool,

    /// Request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Print the info document as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let kubeconfig_path = match &args.kubeconfig {
        Some(path) => path.clone(),
        None => kubeconfig::default_path().context("Failed to locate kubeconfig")?,
    };
    debug!("Using kubeconfig {}", kubeconfig_path.display());

    let kubeconfig = KubeConfig::from_file(&kubeconfig_path)
        .with_context(|| format!("Failed to load kubeconfig {}", kubeconfig_path.display()))?;

    let ca_certificate = args
        .cacert
        .as_ref()
        .map(|path| {
            std::fs::read(path)
                .with_context(|| format!("Failed to read CA bundle {}", path.display()))
        })
        .transpose()?;

    let config = build_config(&args, &kubeconfig, kubeconfig_path, ca_certificate);
    info!("Authenticating as '{}' against {}", config.user, config.api_url);

    let client = KorifiClient::new(config, &kubeconfig.auth_entries())
        .context("Error creating HTTP client")?;

    let info = client.get_info().await.context("Error getting info")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Korifi Info: name={} version={}", info.name, info.version);
    }

    Ok(())
}

/// Turns command-line arguments into a client configuration.
///
/// The user comes from `--user`, else the current kubeconfig context, else
/// the `kind` default.
fn build_config(
    args: &Args,
    kubeconfig: &KubeConfig,
    kubeconfig_path: PathBuf,
    ca_certificate: Option<Vec<u8>>,
) -> ClientConfig {
    let user = args
        .user
        .clone()
        .or_else(|| kubeconfig.current_user().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_USER.to_string());

    let mut config = ClientConfig::new(args.api_url.clone())
        .with_user(user)
        .with_kubeconfig(kubeconfig_path)
        .with_insecure_skip_tls_verify(args.insecure_skip_tls_verify);

    if let Some(pem) = ca_certificate {
        config = config.with_ca_certificate(pem);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout_seconds(timeout);
    }

    config
}

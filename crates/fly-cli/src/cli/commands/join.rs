//! `fly join` - serve as a node, or dial one.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use tracing::{info, warn};

use super::Context;
use crate::cli::args::JoinArgs;
use crate::output::{self, OutputFormat};
use fly_core::{Fingerprint, FlyError};
use fly_node::{server, KnownHosts, NodeClient, TrustPolicy};

pub async fn execute(ctx: Context, args: JoinArgs) -> Result<()> {
    match args.host.clone() {
        Some(host) => dial(ctx, args, &host).await,
        None => serve(ctx, args).await,
    }
}

async fn serve(ctx: Context, args: JoinArgs) -> Result<()> {
    let mut node = ctx.config.node.clone();
    if let Some(listen) = args.listen {
        node.listen = listen;
    } else if let Some(port) = args.port {
        node.listen.set_port(port);
    }

    let server = server::start(&node, ctx.credentials.clone()).await?;
    let paths = ctx.credentials.paths();

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&json!({
            "listen": server.local_addr(),
            "certificate": paths.certificate,
            "private_key": paths.private_key,
            "fingerprint": server.fingerprint(),
        }))?,
        OutputFormat::Pretty => {
            println!("{}", paths.certificate.display());
            output::print_field("Listening", format!("https://{}", server.local_addr()));
            output::print_field("Fingerprint", server.fingerprint().to_string().cyan());
            println!(
                "\nPeers can join with: {}",
                format!("fly join <this-host> --pin {}", server.fingerprint()).green()
            );
        }
    }

    server.shutdown_on_ctrl_c();
    server.wait().await?;
    Ok(())
}

async fn dial(ctx: Context, args: JoinArgs, host: &str) -> Result<()> {
    let known_hosts_path = ctx.config.known_hosts_path();
    let mut known = KnownHosts::load(&known_hosts_path)?;
    let policy = resolve_policy(args.pin, args.insecure, &known, host);

    let client = NodeClient::builder(policy)
        .port(args.port.unwrap_or(ctx.config.node.dial_port))
        .timeout(ctx.config.node.request_timeout())
        .build();
    let response = match client.get(host, &args.path).await {
        Ok(response) => response,
        Err(e @ FlyError::UntrustedPeer { .. }) => {
            return Err(anyhow::Error::new(e).context(format!(
                "refusing to talk to {host}; if it was re-provisioned run `fly hosts forget {host}`"
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if policy == TrustPolicy::TrustOnFirstUse {
        if let Some(fingerprint) = response.peer_fingerprint {
            known.insert(host, fingerprint);
            known.save(&known_hosts_path)?;
            info!(host, fingerprint = %fingerprint, "remembered new peer");
        }
    }

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&response)?,
        OutputFormat::Pretty => {
            if ctx.verbose {
                eprintln!("{} {}", "Status:".bold(), response.status);
                for (name, value) in &response.headers {
                    eprintln!("  {}: {}", name.dimmed(), value);
                }
            }
            if !(200..300).contains(&response.status) {
                warn!(status = response.status, "peer answered with an error status");
            }
            print!("{}", response.body);
        }
    }

    Ok(())
}

/// `--pin`, then `--insecure`, then a remembered fingerprint, then first use.
pub fn resolve_policy(
    pin: Option<Fingerprint>,
    insecure: bool,
    known: &KnownHosts,
    host: &str,
) -> TrustPolicy {
    match (pin, insecure) {
        (Some(fingerprint), _) => TrustPolicy::Pinned(fingerprint),
        (None, true) => TrustPolicy::Insecure,
        (None, false) => known.policy_for(host),
    }
}

//! `fly hosts` - peers remembered on first contact.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{HostsArgs, HostsCommands};
use crate::output::{self, OutputFormat};
use fly_node::KnownHosts;

pub fn execute(ctx: Context, args: HostsArgs) -> Result<()> {
    match args.command.unwrap_or(HostsCommands::List) {
        HostsCommands::List => list(&ctx),
        HostsCommands::Forget { host } => forget(&ctx, &host),
    }
}

fn list(ctx: &Context) -> Result<()> {
    let known = KnownHosts::load(&ctx.config.known_hosts_path())?;

    match ctx.output_format {
        OutputFormat::Json => {
            let entries: std::collections::BTreeMap<_, _> = known.iter().collect();
            output::print_json(&entries)?;
        }
        OutputFormat::Pretty => {
            if known.is_empty() {
                println!("{}", "No known hosts yet.".dimmed());
            }
            for (host, fingerprint) in known.iter() {
                println!("{}  {}", fingerprint.to_string().cyan(), host);
            }
        }
    }

    Ok(())
}

fn forget(ctx: &Context, host: &str) -> Result<()> {
    let path = ctx.config.known_hosts_path();
    let mut known = KnownHosts::load(&path)?;

    if known.remove(host).is_some() {
        known.save(&path)?;
        println!("Forgot {}", host.bold());
    } else {
        println!("{} is not a known host", host.bold());
    }

    Ok(())
}

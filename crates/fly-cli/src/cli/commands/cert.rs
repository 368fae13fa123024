//! `fly cert` - where this node's identity lives and what it says.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use super::Context;
use crate::cli::args::{CertArgs, CertCommands};
use crate::output::{self, OutputFormat};
use fly_core::inspect;
use fly_node::server;

pub async fn execute(ctx: Context, args: CertArgs) -> Result<()> {
    // Default to showing the certificate if no subcommand
    match args.command.unwrap_or(CertCommands::Show) {
        CertCommands::Path => show_paths(&ctx),
        CertCommands::Show => show_certificate(&ctx).await,
        CertCommands::Fingerprint => show_fingerprint(&ctx).await,
    }
}

fn show_paths(ctx: &Context) -> Result<()> {
    let paths = ctx.credentials.paths();

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&json!({
            "certificate": paths.certificate,
            "private_key": paths.private_key,
            "exists": paths.exists(),
        })),
        OutputFormat::Pretty => {
            println!("{}", paths.certificate.display());
            println!("{}", paths.private_key.display());
            Ok(())
        }
    }
}

async fn show_certificate(ctx: &Context) -> Result<()> {
    let paths = server::bootstrap(ctx.credentials.clone()).await?;
    let summary = inspect::summarize_file(&paths.certificate)?;

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&summary)?,
        OutputFormat::Pretty => {
            let subject = if summary.subject.is_empty() {
                "(empty)".dimmed().to_string()
            } else {
                summary.subject.clone()
            };
            output::print_field("Certificate", paths.certificate.display());
            output::print_field("Key", paths.private_key.display());
            output::print_field("Serial", &summary.serial);
            output::print_field("Subject", &subject);
            output::print_field("Not before", summary.not_before.to_rfc3339());
            output::print_field("Not after", summary.not_after.to_rfc3339());
            output::print_field(
                "Key size",
                summary
                    .key_bits
                    .map_or_else(|| "unknown".to_string(), |bits| format!("RSA {bits} bits")),
            );
            output::print_field(
                "Self-signed",
                if summary.self_signed { "yes".green() } else { "no".red() },
            );
            output::print_field("Fingerprint", summary.fingerprint.to_string().cyan());
        }
    }

    Ok(())
}

async fn show_fingerprint(ctx: &Context) -> Result<()> {
    let paths = server::bootstrap(ctx.credentials.clone()).await?;
    let fingerprint = fly_core::Fingerprint::of_pem_file(&paths.certificate)?;

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&json!({ "fingerprint": fingerprint }))?,
        OutputFormat::Pretty => println!("{fingerprint}"),
    }

    Ok(())
}

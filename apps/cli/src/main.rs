mod config;
mod decode;
mod main_lib;
mod sink;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::Config;
use ledgerly_core::recognition::provider_tag;
use ledgerly_core::ImportServiceTrait;
use main_lib::{build_service, init_tracing};

#[derive(Parser)]
#[command(name = "ledgerly", version, about = "Import broker and bank statements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the provider tag a statement is recognized as.
    Identify { file: PathBuf },
    /// Parse, convert and save a statement.
    Import {
        file: PathBuf,
        /// Where to write the JSON batch (overrides LEDGERLY_OUTPUT)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the normalized transactions instead of saving them
        #[arg(long)]
        dry_run: bool,
    },
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    init_tracing(&config);

    match cli.command {
        Command::Identify { file } => {
            let content = decode::decode_file(&file)?;
            let provider = ledgerly_core::identify(&content, &file_name(&file));
            println!("{}", provider_tag(provider));
        }
        Command::Import {
            file,
            output,
            dry_run,
        } => {
            if let Some(output) = output {
                config.output = output;
            }
            let content = decode::decode_file(&file)?;
            let service = build_service(&config);
            let filename = file_name(&file);

            if dry_run {
                let preview = service
                    .preview(&content, &filename)
                    .await
                    .with_context(|| format!("Cannot import {}", file.display()))?;
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                let report = service
                    .import(&content, &filename)
                    .await
                    .with_context(|| format!("Cannot import {}", file.display()))?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
    }
    Ok(())
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves the account settings of one address and prints them as YAML.

use clap::Parser;
use maildiscover::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "maildiscover")]
#[command(about = "Resolve mail, CalDAV and CardDAV settings for an address")]
struct Args {
    /// Mail address to resolve, e.g. jane@example.com
    address: String,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Services to resolve (email, caldav, carddav), all enabled ones by default
    #[arg(short, long)]
    services: Option<String>,

    /// Also read MAILDISCOVER_* environment variables
    #[arg(long)]
    env: bool,

    /// Log resolution decisions
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let mut builder = AccountResolver::builder();
    if let Some(path) = &args.config {
        builder = builder.with_yaml_file(path)?;
    }
    if args.env {
        builder = builder.with_source(Box::new(EnvVarAdapter::new()));
    }

    let resolver = builder.build()?;
    let settings = resolver.resolve(&args.address, args.services.as_deref())?;
    Ok(serde_yaml::to_string(&settings)?)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(yaml) => {
            print!("{}", yaml);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

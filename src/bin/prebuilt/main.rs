//! prebuilt CLI - native add-on provisioning

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use prebuilt::GlobalContext;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("prebuilt=debug")
    } else {
        EnvFilter::new("prebuilt=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut ctx = match cli.root {
        Some(root) => GlobalContext::with_root(
            std::path::absolute(&root)
                .with_context(|| format!("invalid root directory `{}`", root.display()))?,
        ),
        None => GlobalContext::new()?,
    };
    ctx.set_verbose(cli.verbose);

    // Execute command
    match cli.command {
        Commands::Install(args) => commands::install::execute(&ctx, args),
        Commands::Matrix(args) => commands::matrix::execute(&ctx, args),
        Commands::Flags(args) => commands::flags::execute(&ctx, args),
        Commands::Clean(args) => commands::clean::execute(&ctx, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

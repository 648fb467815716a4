//! rulemark command-line entry point.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use rulemark::cli::{self, Command};
use rulemark::{Engine, EngineConfig};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn load_config(args: &cli::Args) -> Result<EngineConfig> {
    match &args.config {
        Some(path) => EngineConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config {}", path)),
        None => Ok(EngineConfig::default()),
    }
}

fn write_output(output: Option<&str>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text).with_context(|| format!("Failed to write {}", path)),
        None => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // RUST_LOG wins over --verbose, e.g. RUST_LOG=rulemark::validation=trace
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("rulemark=debug")
    } else {
        EnvFilter::new("rulemark=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", args.verbose);

    // Validation passes recurse over the document tree
    rayon::ThreadPoolBuilder::new()
        .stack_size(8 * 1024 * 1024)
        .build_global()
        .ok();

    let mut config = load_config(&args)?;

    match args.command {
        Command::Validate {
            paths,
            fix,
            alias_policy,
            no_external,
        } => {
            if let Some(policy) = alias_policy {
                config.alias_policy = policy;
            }
            if no_external {
                config.external_refs = false;
            }
            let engine = Engine::new(config);
            let (rendered, all_valid) =
                commands::validate_command(&engine, paths, fix, args.format)?;
            write_output(args.output.as_deref(), &rendered)?;
            if !all_valid {
                std::process::exit(1);
            }
        }
        Command::Serve => {
            let engine = Engine::new(config);
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            rulemark::server::serve(&engine, stdin.lock(), stdout.lock())?;
        }
    }

    Ok(())
}

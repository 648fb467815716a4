use crate::config::AliasPolicy;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rulemark")]
#[command(about = "Validate and auto-correct structured rule documents")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output format (json, terminal)
    #[arg(short, long, global = true, default_value = "terminal")]
    pub format: OutputFormat,

    /// Write output to file
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate rule documents (files or directories; `-` reads paths from stdin)
    Validate {
        #[arg(required = true)]
        paths: Vec<String>,

        /// Write corrected text back to each file
        #[arg(long)]
        fix: bool,

        /// How bare YAML aliases are handled (overrides the config file)
        #[arg(long)]
        alias_policy: Option<AliasPolicy>,

        /// Check `$refs` references without loading the referenced files
        #[arg(long)]
        no_external: bool,
    },

    /// Serve validation requests as line-delimited JSON-RPC over stdio
    Serve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output for machine consumption
    Json,
    /// Human-readable terminal output
    Terminal,
}

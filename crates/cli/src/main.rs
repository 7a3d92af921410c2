use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use unibucket::Config;

mod cli;

use cli::{Op, OpContext};
use cli::ops::{Cat, Clean, Cp, Create, Ls, Mkdir, Mv, Put, Rm, Stat, Tree};

command_enum! {
    (Ls, Ls),
    (Tree, Tree),
    (Cat, Cat),
    (Put, Put),
    (Stat, Stat),
    (Mkdir, Mkdir),
    (Cp, Cp),
    (Mv, Mv),
    (Rm, Rm),
    (Create, Create),
    (Clean, Clean),
}

/// Work with local directories and object store buckets through one
/// hierarchical interface.
#[derive(Parser, Debug)]
#[command(name = "ubk", version, about)]
struct Cli {
    /// Bucket configuration file (TOML)
    #[arg(long, short, env = "UBK_CONFIG", conflicts_with = "local")]
    config: Option<PathBuf>,

    /// Use this local directory as the bucket instead of a configuration file
    #[arg(long)]
    local: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        match (&self.config, &self.local) {
            (Some(path), _) => Config::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display())),
            (None, Some(root)) => Ok(Config::local(root)),
            (None, None) => Ok(Config::local(".")),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &Cli) -> anyhow::Result<OpOutput> {
    let opened = args.config()?.open().context("opening bucket")?;
    let ctx = OpContext::from(opened);
    Ok(args.command.execute(&ctx).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match run(&args).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {err:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

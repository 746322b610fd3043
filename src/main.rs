//! The lochound binary.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use lochound::harvest::config::{self, HarvestConfig};
use lochound::cli::{doctor, harvest_cmd, install_cmd};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "lochound",
    version,
    about = "Stealth-browser sitemap harvester",
    long_about = "Fetches an XML sitemap index with a stealth-patched Chromium, \
                  discovers sub-sitemaps, and extracts every <loc> URL into a \
                  sorted, deduplicated text file."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress all non-error output
    #[arg(long, global = true)]
    quiet: bool,

    /// Verbose output (per-sitemap details, debug logging)
    #[arg(long, global = true)]
    verbose: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest product URLs from a sitemap index
    Harvest(HarvestArgs),
    /// Check that this machine can run a harvest
    Doctor,
    /// Download Chrome for Testing into ~/.lochound/chromium/
    Install {
        /// Reinstall even if a Chromium is already present
        #[arg(long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct HarvestArgs {
    /// Sitemap index URL
    #[arg(long, default_value = config::DEFAULT_INDEX_URL)]
    index_url: String,

    /// Output file (default: <host-label>_product_urls.txt)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Concurrent headless fetches
    #[arg(long, default_value_t = config::DEFAULT_WORKERS)]
    workers: usize,

    /// Seconds to wait for a <loc> element to appear in the DOM
    #[arg(long, default_value_t = 60)]
    loc_timeout: u64,

    /// Seconds allowed per page navigation
    #[arg(long, default_value_t = 45)]
    nav_timeout: u64,

    /// Fetch the index headless too instead of with a visible window
    #[arg(long)]
    headless_index: bool,

    /// Keep only URLs matching this regex
    #[arg(long)]
    filter: Option<String>,

    /// Chromium executable to use (or set LOCHOUND_CHROMIUM_PATH)
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Launch Chromium with --no-sandbox (forced on in Docker)
    #[arg(long)]
    no_sandbox: bool,

    /// Audit log location (default: ~/.lochound/harvest.jsonl)
    #[arg(long)]
    audit_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Output-mode flags travel as env vars so every module sees them.
    if cli.quiet {
        std::env::set_var("LOCHOUND_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("LOCHOUND_VERBOSE", "1");
    }
    if cli.json {
        std::env::set_var("LOCHOUND_JSON", "1");
    }
    if cli.no_color {
        std::env::set_var("LOCHOUND_NO_COLOR", "1");
    }

    // Progress bars own the terminal, so logs default to warn.
    let default_directive = if cli.verbose {
        "lochound=debug"
    } else {
        "lochound=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Harvest(args) => {
            let filter = args
                .filter
                .as_deref()
                .map(regex::Regex::new)
                .transpose()
                .context("invalid --filter regex")?;

            let config = HarvestConfig {
                index_url: args.index_url,
                output_path: args.out,
                workers: args.workers,
                loc_timeout: Duration::from_secs(args.loc_timeout),
                nav_timeout: Duration::from_secs(args.nav_timeout),
                headless_index: args.headless_index,
                filter,
                chromium_path: args.chromium,
                no_sandbox: args.no_sandbox,
                audit_path: args.audit_log,
            };
            harvest_cmd::run(config).await
        }
        Commands::Doctor => doctor::run().await,
        Commands::Install { force } => install_cmd::run(force).await,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "lochound",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

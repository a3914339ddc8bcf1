// Copyright 2026 Screener Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use screener_runtime::ai::Provider;
use screener_runtime::cli::{self, analyze_cmd::AnalyzeArgs, output};
use screener_runtime::config::ScreenerConfig;
use screener_runtime::logging::{self, Verbosity};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "screener",
    about = "Screener: compliance status, insider activity, and AI analysis for stock tickers",
    version,
    after_help = "Run 'screener <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Chromium binary to use instead of auto-discovery
    #[arg(long, global = true)]
    chromium: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the compliance status of a ticker
    Status {
        /// Ticker symbol (e.g. "AAPL")
        ticker: String,
    },
    /// Summarize recent insider trades for a ticker
    Insider {
        /// Ticker symbol
        ticker: String,
    },
    /// Ask an AI provider for an analysis of a ticker
    Analyze {
        /// Ticker symbol
        ticker: String,
        /// Company name used in the prompt
        #[arg(long)]
        company: Option<String>,
        /// Provider (gemini, openai)
        #[arg(long, default_value = "gemini")]
        provider: Provider,
        /// Ground the answer in web search
        #[arg(long)]
        search: bool,
        /// Send this prompt instead of the default one
        #[arg(long)]
        prompt: Option<String>,
        /// Provider key (defaults to GEMINI_API_KEY / OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
        /// Include scraped insider activity in the prompt
        #[arg(long)]
        with_insider: bool,
    },
    /// Classify a saved HTML page without a browser
    Classify {
        /// Path to the saved page
        file: PathBuf,
    },
    /// Serve the REST API
    Serve {
        /// Port to listen on (127.0.0.1)
        #[arg(long, default_value = "7878")]
        port: u16,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json {
        std::env::set_var(output::JSON_ENV, "1");
    }
    if cli.quiet {
        std::env::set_var(output::QUIET_ENV, "1");
    }
    logging::init_tracing(cli.json, Verbosity::from_flags(cli.quiet, cli.verbose));

    let mut config = ScreenerConfig::from_env();
    if cli.chromium.is_some() {
        config.chromium_path = cli.chromium;
    }

    let result = match cli.command {
        Commands::Status { ticker } => cli::status_cmd::run(&ticker, &config).await,
        Commands::Insider { ticker } => cli::insider_cmd::run(&ticker, &config).await,
        Commands::Analyze {
            ticker,
            company,
            provider,
            search,
            prompt,
            api_key,
            with_insider,
        } => {
            let args = AnalyzeArgs {
                ticker,
                company,
                provider,
                search,
                prompt,
                api_key,
                with_insider,
            };
            cli::analyze_cmd::run(args, &config).await
        }
        Commands::Classify { file } => cli::classify_cmd::run(&file).await,
        Commands::Serve { port } => cli::serve::run(port, &config).await,
        Commands::Doctor => cli::doctor::run(&config).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "screener", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "success": false,
                "error": format!("{e:#}"),
            }));
        } else if !output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}

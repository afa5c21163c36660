use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agentforge")]
#[command(
    version,
    about = "Dynamic code-analysis agent factory backed by LLM generation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize AgentForge in the current directory
    Init,

    /// Generate (or retrieve) the agent for a technology keyword
    Generate {
        #[arg(help = "Technology keyword, e.g. python, react")]
        technology: String,
        #[arg(
            short = 'o',
            long = "option",
            help = "Generation option as key=value (repeatable)"
        )]
        options: Vec<String>,
        #[arg(long, help = "Print the full result as JSON")]
        json: bool,
    },

    /// Detect the best-matching known technology in free text
    Detect {
        #[arg(help = "Free text to scan")]
        text: String,
    },

    /// Manage the keyword table
    Keywords {
        #[command(subcommand)]
        action: KeywordAction,
    },

    /// Show agent records
    Agents {
        #[arg(long, help = "Include error histories")]
        history: bool,
    },

    /// Refresh dynamic triggers from the technology registry
    Refresh,

    /// Check whether the configured LLM provider is reachable
    Health,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum KeywordAction {
    /// List known keywords
    List {
        #[arg(short, long, help = "Case-insensitive regex filter")]
        pattern: Option<String>,
    },
    /// Add a keyword
    Add {
        keyword: String,
        description: String,
    },
    /// Remove a keyword and its agent record
    Remove { keyword: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Print as JSON instead of TOML")]
        json: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mAgentForge encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    use agentforge::cli::commands;

    match cli.command {
        Commands::Init => {
            commands::init()?;
        }
        Commands::Generate {
            technology,
            options,
            json,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate(&technology, &options, json))?;
        }
        Commands::Detect { text } => {
            commands::detect(&text)?;
        }
        Commands::Keywords { action } => match action {
            KeywordAction::List { pattern } => {
                commands::keywords_list(pattern.as_deref())?;
            }
            KeywordAction::Add {
                keyword,
                description,
            } => {
                commands::keywords_add(&keyword, &description)?;
            }
            KeywordAction::Remove { keyword } => {
                commands::keywords_remove(&keyword)?;
            }
        },
        Commands::Agents { history } => {
            commands::agents(history)?;
        }
        Commands::Refresh => {
            commands::refresh()?;
        }
        Commands::Health => {
            let rt = Runtime::new()?;
            rt.block_on(commands::health())?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                commands::config_show(json)?;
            }
        },
    }

    Ok(())
}

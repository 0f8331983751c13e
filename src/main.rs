mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::DocumentOptions;

#[derive(Parser)]
#[command(name = "ltex-core", version, about = "Extract checkable plain text from markup and check it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Options for how a document is read.
#[derive(Args)]
struct DocumentArgs {
    /// Natural language of the document, e.g. de-DE
    #[arg(long)]
    language: Option<String>,
    /// Code language id (latex, markdown, org, ...); derived from the file extension if omitted
    #[arg(long)]
    language_id: Option<String>,
    /// Fail instead of skipping a character when a builder gets stuck
    #[arg(long)]
    strict: bool,
}

impl From<DocumentArgs> for DocumentOptions {
    fn from(args: DocumentArgs) -> Self {
        return Self {
            language_id: args.language_id,
            language: args.language,
            strict: args.strict,
        };
    }
}

#[derive(Subcommand)]
#[allow(clippy::arbitrary_source_item_ordering, reason = "help lists subcommands in workflow order")]
enum Commands {
    /// Print the plain text sent to the grammar engine
    Plain {
        /// Document to read, `-` for stdin
        file: PathBuf,
        #[command(flatten)]
        document: DocumentArgs,
    },
    /// Print the annotated text parts as JSON lines
    Annotate {
        /// Document to read, `-` for stdin
        file: PathBuf,
        #[command(flatten)]
        document: DocumentArgs,
    },
    /// Print the fragments a document is split into
    Fragments {
        /// Document to read, `-` for stdin
        file: PathBuf,
        #[command(flatten)]
        document: DocumentArgs,
    },
    /// Check files and directories against a LanguageTool server
    Check {
        /// Files or directories to check
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,
        /// LanguageTool server, e.g. http://localhost:8081
        #[arg(long)]
        server: Option<String>,
        #[command(flatten)]
        document: DocumentArgs,
    },
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Plain { file, document } => commands::plain(&file, &document.into()).map(|()| return ExitCode::SUCCESS),
        Commands::Annotate { file, document } => {
            commands::annotate(&file, &document.into()).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Fragments { file, document } => {
            commands::fragments(&file, &document.into()).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Check { paths, server, document } => commands::check(&paths, server.as_deref(), &document.into()),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            ltex_core::diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}

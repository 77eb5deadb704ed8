//! FSM Language Server
//!
//! Serves LSP over stdio by default. The `check` and `generate` subcommands
//! run the language services without an editor.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tower_lsp::{LspService, Server};

use fsm_lsp::backend::{Backend, LanguageServices};
use fsm_lsp::check::check_files;
use fsm_lsp::language::{self, Generator};
use fsm_lsp::setup::{create_injector, StandaloneSetup};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log filter, e.g. `info` or `fsm_lsp=debug`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate files and print findings; exits non-zero on errors.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the JSON description of a machine.
    Generate {
        file: PathBuf,

        /// Emit single-line JSON.
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout belongs to the LSP transport.
    let mut logger = env_logger::Builder::from_default_env();
    if let Some(filters) = &args.log_level {
        logger.parse_filters(filters);
    }
    logger.init();

    match args.command {
        None => serve().await,
        Some(Command::Check { files }) => check(&files),
        Some(Command::Generate { file, compact }) => generate(&file, !compact),
    }
}

async fn serve() -> anyhow::Result<()> {
    let injector = create_injector()?;
    let services = LanguageServices::resolve(&injector)?;

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(|client| Backend::new(client, services))
        .custom_method("fsm/generate", Backend::generate)
        .finish();
    Server::new(stdin, stdout, socket).serve(service).await;
    Ok(())
}

fn check(files: &[PathBuf]) -> anyhow::Result<()> {
    let injector = StandaloneSetup::create_injector()?;
    let report = check_files(&injector, files)?;
    for finding in &report.findings {
        println!("{finding}");
    }
    if report.has_errors() {
        anyhow::bail!(
            "{} error(s) in {} file(s)",
            report.error_count(),
            report.files
        );
    }
    Ok(())
}

fn generate(file: &Path, pretty: bool) -> anyhow::Result<()> {
    let injector = StandaloneSetup::create_injector()?;
    let parser = injector.resolve::<dyn language::Parser>()?;
    let generator = injector.resolve::<dyn Generator>()?;

    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let model = parser
        .parse(&source)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    println!("{}", generator.generate(&model, pretty)?);
    Ok(())
}

//! nbdocgen CLI
//!
//! Insert a generated markdown description before every code cell of a
//! Jupyter notebook.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use nbdocgen::config::{
    DEFAULT_BASE_PROMPT, DEFAULT_LOG_LEVEL, DEFAULT_MAX_TOKENS, DEFAULT_RETRIES,
    DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, DEFAULT_TOP_P, LOG_LEVEL_ENV, MAX_RETRIES,
};
use nbdocgen::{Annotator, ClientConfig, GeneratorConfig, OpenAIClient, Result};
use nbdocgen_notebook::{check_input_path, check_output_path, load_notebook, write_notebook};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nbdocgen", version)]
#[command(about = "Generate markdown documentation for every code cell of a Jupyter notebook")]
struct Args {
    /// Input Jupyter Notebook
    #[arg(long)]
    input: PathBuf,

    /// Output Jupyter Notebook (must not exist yet)
    #[arg(long)]
    output: PathBuf,

    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Nucleus sampling probability mass
    #[arg(long = "top_p", alias = "top-p", default_value_t = DEFAULT_TOP_P)]
    top_p: f32,

    /// Max tokens per generated description
    #[arg(long = "max_tokens", alias = "max-tokens", default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Instruction sent before each code cell
    #[arg(long = "base_prompt", alias = "base-prompt", default_value = DEFAULT_BASE_PROMPT)]
    base_prompt: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Retries on transient API failures (429, 5xx, timeouts)
    #[arg(
        long,
        default_value_t = DEFAULT_RETRIES,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_RETRIES))
    )]
    retries: u32,

    /// Write indented JSON instead of compact JSON
    #[arg(long)]
    pretty: bool,
}

impl From<&Args> for GeneratorConfig {
    fn from(args: &Args) -> Self {
        Self {
            base_prompt: args.base_prompt.clone(),
            temperature: args.temperature,
            top_p: args.top_p,
            max_tokens: args.max_tokens,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_LEVEL_ENV)
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_precondition() => {
            error!(kind = e.kind(), "{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(kind = e.kind(), "{e}; no output written");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    // All preconditions before touching the input or the network.
    let client_config = ClientConfig::from_env()?
        .with_timeout(Duration::from_secs(args.timeout))
        .with_retries(args.retries);
    check_input_path(&args.input)?;
    check_output_path(&args.input, &args.output)?;

    let notebook = load_notebook(&args.input)?;
    let total_cells = notebook.cells().len();
    info!(
        "Processing {} ({} cells, {} code)",
        args.input.display(),
        total_cells,
        notebook.code_cell_count()
    );

    let client = OpenAIClient::new(client_config, GeneratorConfig::from(args))?;
    let progress = progress_bar(total_cells as u64);
    let annotated = Annotator::new(client).annotate(notebook, &progress).await;
    progress.finish_and_clear();
    let annotated = annotated?;

    write_notebook(&args.output, &annotated, args.pretty)?;
    info!(
        "Wrote {} ({} cells)",
        args.output.display(),
        annotated.cells().len()
    );
    Ok(())
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cells")
            .expect("template is compile-time constant")
            .progress_chars("█▓▒░  "),
    );
    pb
}

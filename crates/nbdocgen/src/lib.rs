//! # nbdocgen
//!
//! Annotates Jupyter notebooks with generated documentation.
//!
//! For every code cell, the `OpenAI` chat completions API is asked for a short
//! description of the code, and the answer is inserted as a new markdown cell
//! directly before the code cell. Everything else in the notebook is copied
//! through unchanged.
//!
//! ## Overview
//!
//! 1. Check preconditions (credential, input exists, output free)
//! 2. Load the notebook ([`nbdocgen_notebook::load_notebook`])
//! 3. Describe each code cell in order, pausing after every request
//! 4. Write the annotated notebook to a new file
//!
//! ## Example Usage
//!
//! ```no_run
//! use indicatif::ProgressBar;
//! use nbdocgen::{Annotator, ClientConfig, GeneratorConfig, OpenAIClient};
//! use nbdocgen_notebook::{load_notebook, write_notebook};
//!
//! # async fn example() -> nbdocgen::Result<()> {
//! let client = OpenAIClient::new(ClientConfig::from_env()?, GeneratorConfig::default())?;
//! let notebook = load_notebook("analysis.ipynb")?;
//! let annotated = Annotator::new(client)
//!     .annotate(notebook, &ProgressBar::hidden())
//!     .await?;
//! write_notebook("analysis.documented.ipynb", &annotated, false)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`annotate`] - Cell assembler and the [`Describe`] seam
//! - [`client`] - `OpenAI` chat completions client with timeout and retry
//! - [`config`] - Defaults, environment variables, generation parameters
//! - [`error`] - Error kinds for a run

pub mod annotate;
pub mod client;
pub mod config;
pub mod error;

pub use annotate::{Annotator, Describe};
pub use client::OpenAIClient;
pub use config::{ClientConfig, GeneratorConfig};
pub use error::{DocgenError, Result};

//! Cell assembler: interleaves generated markdown cells with code cells.
//!
//! Cells are processed strictly in order, one request at a time, with a
//! fixed pause after every request. The output notebook only exists once
//! every cell has been processed; a failure drops all progress.

use crate::config::REQUEST_PAUSE;
use crate::error::Result;
use indicatif::ProgressBar;
use nbdocgen_notebook::{cell_source, is_code_cell, markdown_cell, Notebook};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Source of natural-language descriptions for code snippets
#[allow(async_fn_in_trait)]
pub trait Describe {
    /// Describe one code snippet.
    async fn describe(&self, code: &str) -> Result<String>;
}

/// Adds a generated markdown cell in front of every code cell
#[derive(Debug, Clone)]
pub struct Annotator<D> {
    describer: D,
    pause: Duration,
}

impl<D: Describe> Annotator<D> {
    /// Create an annotator with the standard post-request pause
    #[must_use]
    pub const fn new(describer: D) -> Self {
        Self {
            describer,
            pause: REQUEST_PAUSE,
        }
    }

    /// Override the pause after each request
    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Annotate every code cell of `notebook`.
    ///
    /// `progress` is advanced once per input cell.
    ///
    /// # Errors
    ///
    /// Returns the first description failure; the notebook is dropped.
    pub async fn annotate(
        &self,
        mut notebook: Notebook,
        progress: &ProgressBar,
    ) -> Result<Notebook> {
        let cells = notebook.take_cells();
        let annotated = self.annotate_cells(cells, progress).await?;
        notebook.set_cells(annotated);
        Ok(notebook)
    }

    /// Annotate a list of raw cells.
    ///
    /// # Errors
    ///
    /// Returns the first description failure.
    pub async fn annotate_cells(
        &self,
        cells: Vec<Value>,
        progress: &ProgressBar,
    ) -> Result<Vec<Value>> {
        let code_cells = cells.iter().filter(|c| is_code_cell(c)).count();
        let mut output = Vec::with_capacity(cells.len() + code_cells);
        let mut described = 0;

        for (index, cell) in cells.into_iter().enumerate() {
            if is_code_cell(&cell) {
                let code = cell_source(&cell);
                debug!("Describing cell {index} ({} chars)", code.len());

                let description = self.describer.describe(&code).await?;
                output.push(markdown_cell(&description));
                described += 1;

                // TODO: skip the pause after the last code cell once the
                // rate-limit behaviour is confirmed against the live API.
                tokio::time::sleep(self.pause).await;
            }
            output.push(cell);
            progress.inc(1);
        }

        info!(
            "Generated {described} descriptions for {} cells",
            output.len() - described
        );
        Ok(output)
    }
}

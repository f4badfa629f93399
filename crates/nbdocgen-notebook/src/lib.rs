//! # nbdocgen-notebook
//!
//! Jupyter Notebook (.ipynb) document handling for nbdocgen.
//!
//! Notebooks are kept as raw JSON so that everything this crate does not
//! touch (top-level metadata, cell outputs, execution counts, unknown keys)
//! round-trips unchanged. The crate provides:
//! - Loading and validating a notebook (`cells` must be an array)
//! - Cell helpers: type, joined source text, generated markdown cells
//! - Output path checks and a write that never clobbers an existing file
//!
//! ## Example
//!
//! ```no_run
//! use nbdocgen_notebook::{cell_source, is_code_cell, load_notebook};
//!
//! let notebook = load_notebook("example.ipynb")?;
//! for cell in notebook.cells().iter().filter(|c| is_code_cell(c)) {
//!     println!("{}", cell_source(cell));
//! }
//! # Ok::<(), nbdocgen_notebook::NotebookError>(())
//! ```

/// Error types for notebook handling
pub mod error;
/// Jupyter notebook (ipynb) document model
pub mod ipynb;

pub use error::{NotebookError, Result};
pub use ipynb::{
    cell_source, cell_type, check_input_path, check_output_path, is_code_cell, load_notebook,
    markdown_cell, new_cell_id, parse_notebook_from_str, write_notebook, CellType, Notebook,
    CELL_ID_LEN,
};

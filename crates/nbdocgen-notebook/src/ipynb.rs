use crate::error::{NotebookError, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Length of the opaque id placed in `metadata.id` of generated cells
pub const CELL_ID_LEN: usize = 12;

const CELLS_KEY: &str = "cells";

/// A loaded notebook document.
///
/// The top-level object is kept as-is (insertion ordered), so every key
/// other than `cells` is written back untouched and in its original position.
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    document: Map<String, Value>,
}

/// Type of notebook cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Executable code cell
    #[default]
    Code,
    /// Markdown documentation cell
    Markdown,
    /// Raw text cell (no formatting)
    Raw,
}

impl std::fmt::Display for CellType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
            Self::Raw => "raw",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CellType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "markdown" => Ok(Self::Markdown),
            "raw" => Ok(Self::Raw),
            _ => Err(format!(
                "Unknown cell type '{s}'. Expected: code, markdown, raw"
            )),
        }
    }
}

impl Notebook {
    /// Cells in document order
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Value] {
        self.document
            .get(CELLS_KEY)
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Number of code cells in the notebook
    #[must_use]
    pub fn code_cell_count(&self) -> usize {
        self.cells().iter().filter(|c| is_code_cell(c)).count()
    }

    /// Move the cells out, leaving an empty array in their slot.
    pub fn take_cells(&mut self) -> Vec<Value> {
        match self.document.get_mut(CELLS_KEY) {
            Some(Value::Array(cells)) => std::mem::take(cells),
            _ => Vec::new(),
        }
    }

    /// Replace the cells. The `cells` key keeps its original position.
    pub fn set_cells(&mut self, cells: Vec<Value>) {
        self.document.insert(CELLS_KEY.to_string(), Value::Array(cells));
    }

    /// Top-level document object
    #[inline]
    #[must_use]
    pub const fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Serialize the notebook.
    ///
    /// Compact by default; `pretty` indents and appends a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        if pretty {
            let mut s = serde_json::to_string_pretty(&self.document)?;
            s.push('\n');
            Ok(s)
        } else {
            Ok(serde_json::to_string(&self.document)?)
        }
    }
}

/// Load a notebook from a file path
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or cannot be read (`InvalidInput`)
/// - The content is not JSON or has no `cells` array
pub fn load_notebook<P: AsRef<Path>>(path: P) -> Result<Notebook> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| NotebookError::InvalidInput {
        path: path.to_path_buf(),
        source,
    })?;
    let notebook = parse_notebook_from_str(&content)?;
    debug!(
        "Loaded {} ({} cells, {} code)",
        path.display(),
        notebook.cells().len(),
        notebook.code_cell_count()
    );
    Ok(notebook)
}

/// Parse a notebook from a string
///
/// # Errors
///
/// Returns an error if the JSON is malformed, the top level is not an
/// object, or `cells` is absent or not an array.
pub fn parse_notebook_from_str(content: &str) -> Result<Notebook> {
    let value: Value = serde_json::from_str(content)?;

    let Value::Object(document) = value else {
        return Err(NotebookError::MalformedDocument(
            "top-level value is not a JSON object".to_string(),
        ));
    };

    match document.get(CELLS_KEY) {
        Some(Value::Array(_)) => Ok(Notebook { document }),
        Some(_) => Err(NotebookError::MalformedDocument(
            "`cells` is not an array".to_string(),
        )),
        None => Err(NotebookError::MalformedDocument(
            "missing `cells` key".to_string(),
        )),
    }
}

/// Cell type of a raw cell, `None` if missing or unrecognised
#[must_use]
pub fn cell_type(cell: &Value) -> Option<CellType> {
    cell.get("cell_type")?.as_str()?.parse().ok()
}

/// Whether the cell is a code cell
#[inline]
#[must_use]
pub fn is_code_cell(cell: &Value) -> bool {
    cell_type(cell) == Some(CellType::Code)
}

/// Source text of a cell.
///
/// List-form sources are joined with `"\n"`; string-form sources are used
/// as-is; a missing source is empty.
#[must_use]
pub fn cell_source(cell: &Value) -> String {
    match cell.get("source") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Build a markdown cell holding `text`, with a fresh id in `metadata.id`.
#[must_use]
pub fn markdown_cell(text: &str) -> Value {
    json!({
        "cell_type": CellType::Markdown.to_string(),
        "metadata": { "id": new_cell_id() },
        "source": [text],
    })
}

/// Fresh opaque cell id (prefix of a random v4 UUID)
#[must_use]
pub fn new_cell_id() -> String {
    let mut id = uuid::Uuid::new_v4().hyphenated().to_string();
    id.truncate(CELL_ID_LEN);
    id
}

/// Check that `input` exists, without opening it.
///
/// # Errors
///
/// Returns `InvalidInput` if the path does not exist.
pub fn check_input_path(input: &Path) -> Result<()> {
    if input.exists() {
        Ok(())
    } else {
        Err(NotebookError::InvalidInput {
            path: input.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "does not exist"),
        })
    }
}

/// Check that `output` is usable as a destination for `input`.
///
/// Paths are compared as strings; no canonicalization is done.
///
/// # Errors
///
/// Returns `OutputConflict` if the output path is empty, equals the input
/// path, or already exists.
pub fn check_output_path(input: &Path, output: &Path) -> Result<()> {
    if output.as_os_str().is_empty() {
        return Err(NotebookError::OutputConflict(
            "output file path is empty".to_string(),
        ));
    }

    if input.as_os_str() == output.as_os_str() {
        return Err(NotebookError::OutputConflict(format!(
            "{}\nInput and output file names are the same - please use a different filename for output notebook",
            output.display()
        )));
    }

    if output.exists() {
        return Err(NotebookError::OutputConflict(format!(
            "{} already exists - please use a different name",
            output.display()
        )));
    }

    Ok(())
}

/// Write the notebook to a new file.
///
/// The content goes to a temporary file next to `path`, which is then
/// moved into place without replacing anything. A failed write leaves no
/// file at `path`, and an existing file is never overwritten.
///
/// # Errors
///
/// Returns `OutputConflict` if the file already exists, or an I/O error.
pub fn write_notebook<P: AsRef<Path>>(path: P, notebook: &Notebook, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let content = notebook.to_json_string(pretty)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    file.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            NotebookError::OutputConflict(format!(
                "{} already exists - please use a different name",
                path.display()
            ))
        } else {
            NotebookError::Io(e.error)
        }
    })?;

    debug!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SIMPLE: &str = r##"{
        "nbformat": 4,
        "cells": [
            {
                "cell_type": "markdown",
                "metadata": {},
                "source": ["# Hello World\n", "This is a test notebook."]
            },
            {
                "cell_type": "code",
                "metadata": {},
                "execution_count": 1,
                "source": ["import os", "print(os.getcwd())"],
                "outputs": []
            }
        ],
        "metadata": {
            "kernelspec": { "name": "python3", "display_name": "Python 3" }
        },
        "nbformat_minor": 5
    }"##;

    #[test]
    fn test_parse_simple_notebook() {
        let notebook = parse_notebook_from_str(SIMPLE).unwrap();
        assert_eq!(notebook.cells().len(), 2);
        assert_eq!(cell_type(&notebook.cells()[0]), Some(CellType::Markdown));
        assert_eq!(cell_type(&notebook.cells()[1]), Some(CellType::Code));
        assert_eq!(notebook.code_cell_count(), 1);
    }

    #[test]
    fn test_missing_cells_is_malformed() {
        let err = parse_notebook_from_str(r#"{"metadata": {}}"#).unwrap_err();
        assert!(matches!(err, NotebookError::MalformedDocument(_)));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_cells_not_array_is_malformed() {
        let err = parse_notebook_from_str(r#"{"cells": {}}"#).unwrap_err();
        assert!(matches!(err, NotebookError::MalformedDocument(_)));
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = parse_notebook_from_str("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, NotebookError::MalformedDocument(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_notebook_from_str("{ not json").unwrap_err();
        assert!(matches!(err, NotebookError::Json(_)));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_load_missing_file_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let err = load_notebook(dir.path().join("nope.ipynb")).unwrap_err();
        assert!(matches!(err, NotebookError::InvalidInput { .. }));
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_cell_source_forms() {
        let list = json!({ "source": ["a = 1", "b = 2"] });
        assert_eq!(cell_source(&list), "a = 1\nb = 2");

        let string = json!({ "source": "x = 2" });
        assert_eq!(cell_source(&string), "x = 2");

        let missing = json!({ "cell_type": "code" });
        assert_eq!(cell_source(&missing), "");
    }

    #[test]
    fn test_unknown_or_missing_cell_type_is_not_code() {
        assert_eq!(cell_type(&json!({ "cell_type": "heading" })), None);
        assert_eq!(cell_type(&json!({ "cell_type": 3 })), None);
        assert!(!is_code_cell(&json!({})));
        assert!(!is_code_cell(&json!({ "cell_type": "CODE" })));
    }

    #[test]
    fn test_markdown_cell_shape() {
        let cell = markdown_cell("Prints one.");
        assert_eq!(cell["cell_type"], "markdown");
        assert_eq!(cell["source"], json!(["Prints one."]));
        assert_eq!(cell["metadata"]["id"].as_str().unwrap().len(), CELL_ID_LEN);
    }

    #[test]
    fn test_cell_ids_do_not_collide() {
        let ids: std::collections::HashSet<String> = (0..200).map(|_| new_cell_id()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_set_cells_keeps_key_order() {
        let mut notebook = parse_notebook_from_str(SIMPLE).unwrap();
        let mut cells = notebook.take_cells();
        cells.insert(0, markdown_cell("doc"));
        notebook.set_cells(cells);

        let keys: Vec<&str> = notebook.document().keys().map(String::as_str).collect();
        assert_eq!(keys, ["nbformat", "cells", "metadata", "nbformat_minor"]);
        assert_eq!(notebook.cells().len(), 3);
    }

    #[test]
    fn test_cell_type_display() {
        assert_eq!(format!("{}", CellType::Code), "code");
        assert_eq!(format!("{}", CellType::Markdown), "markdown");
        assert_eq!(format!("{}", CellType::Raw), "raw");
    }

    #[test]
    fn test_cell_type_from_str_is_exact() {
        assert_eq!("code".parse::<CellType>().unwrap(), CellType::Code);
        assert_eq!("markdown".parse::<CellType>().unwrap(), CellType::Markdown);
        assert_eq!("raw".parse::<CellType>().unwrap(), CellType::Raw);
        assert!("Code".parse::<CellType>().is_err());
        assert!("md".parse::<CellType>().is_err());
    }

    #[test]
    fn test_check_output_path() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.ipynb");
        let output = dir.path().join("out.ipynb");
        fs::write(&input, SIMPLE).unwrap();

        assert!(check_output_path(&input, &output).is_ok());
        assert!(matches!(
            check_output_path(&input, Path::new("")),
            Err(NotebookError::OutputConflict(_))
        ));
        assert!(matches!(
            check_output_path(&input, &input),
            Err(NotebookError::OutputConflict(_))
        ));

        fs::write(&output, "{}").unwrap();
        assert!(matches!(
            check_output_path(&input, &output),
            Err(NotebookError::OutputConflict(_))
        ));
    }

    #[test]
    fn test_check_input_path() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.ipynb");
        assert!(matches!(
            check_input_path(&input),
            Err(NotebookError::InvalidInput { .. })
        ));
        fs::write(&input, SIMPLE).unwrap();
        assert!(check_input_path(&input).is_ok());
    }

    #[test]
    fn test_write_notebook_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.ipynb");
        let notebook = parse_notebook_from_str(SIMPLE).unwrap();

        write_notebook(&output, &notebook, false).unwrap();
        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(parse_notebook_from_str(&written).unwrap(), notebook);

        let err = write_notebook(&output, &notebook, true).unwrap_err();
        assert!(matches!(err, NotebookError::OutputConflict(_)));
        assert_eq!(fs::read_to_string(&output).unwrap(), written);

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("missing").join("out.ipynb");
        let notebook = parse_notebook_from_str(SIMPLE).unwrap();

        let err = write_notebook(&output, &notebook, false).unwrap_err();
        assert!(matches!(err, NotebookError::Io(_)));
        assert!(!output.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_numbers_written_verbatim() {
        let input = r#"{"cells":[],"metadata":{"big":123456789012345678901234567890,"f":1e5,"x":1.10}}"#;
        let notebook = parse_notebook_from_str(input).unwrap();
        assert_eq!(notebook.to_json_string(false).unwrap(), input);
    }

    #[test]
    fn test_pretty_output_ends_with_newline() {
        let notebook = parse_notebook_from_str(SIMPLE).unwrap();
        let pretty = notebook.to_json_string(true).unwrap();
        assert!(pretty.ends_with("}\n"));
        assert!(!notebook.to_json_string(false).unwrap().contains('\n'));
    }
}

//! Spreadsheet import for kbdesk.
//!
//! Reads the first sheet of a workbook (or a CSV file), locates the
//! question and answer columns by header alias, and returns the rows as
//! insert candidates. Nothing here touches the store: the caller hands
//! [`ImportReport::items`] to the knowledge service's bulk create.

use kbdesk_core::error::ImportError;
use kbdesk_core::knowledge::NewKnowledge;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Header aliases for the question column, highest priority first.
pub const QUESTION_ALIASES: &[&str] = &["Qual o seu erro?", "Pergunta", "question", "Erro"];

/// Header aliases for the answer column, highest priority first.
pub const ANSWER_ALIASES: &[&str] = &["Resposta", "answer", "Solução"];

/// How the input bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    /// xlsx, xlsm, xlsb, xls or ods. Only the first sheet is read.
    Workbook,
}

impl SheetFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SheetFormat::Workbook),
            _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Result of mapping a sheet onto knowledge items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows with both a question and an answer, trimmed, in sheet order.
    pub items: Vec<NewKnowledge>,
    /// Non-blank rows missing either field.
    pub dropped: usize,
}

/// Read and map a spreadsheet file.
pub fn import_file(path: &Path) -> kbdesk_core::Result<ImportReport> {
    let format = SheetFormat::from_path(path)?;
    let bytes = std::fs::read(path)
        .map_err(|e| ImportError::Unreadable(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), ?format, "Importing spreadsheet");
    import_bytes(&bytes, format)
}

/// Map raw spreadsheet bytes onto knowledge items.
pub fn import_bytes(bytes: &[u8], format: SheetFormat) -> kbdesk_core::Result<ImportReport> {
    let rows = match format {
        SheetFormat::Csv => read_csv(bytes)?,
        SheetFormat::Workbook => read_workbook(bytes)?,
    };
    Ok(map_rows(&rows)?)
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(String::from).collect())
                .map_err(|e| ImportError::Unreadable(e.to_string()))
        })
        .collect()
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::MissingHeader)?
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

/// Column indices for each alias that appears in the header, in alias order.
fn alias_columns(header: &[String], aliases: &[&str]) -> Vec<usize> {
    aliases
        .iter()
        .filter_map(|alias| {
            let alias = alias.to_lowercase();
            header.iter().position(|h| h.trim().to_lowercase() == alias)
        })
        .collect()
}

/// First non-empty cell among `columns`, trimmed.
fn pick(row: &[String], columns: &[usize]) -> Option<String> {
    columns
        .iter()
        .filter_map(|&i| row.get(i))
        .map(|cell| cell.trim())
        .find(|cell| !cell.is_empty())
        .map(String::from)
}

fn map_rows(rows: &[Vec<String>]) -> Result<ImportReport, ImportError> {
    let (header, data) = rows.split_first().ok_or(ImportError::MissingHeader)?;

    let question_cols = alias_columns(header, QUESTION_ALIASES);
    let answer_cols = alias_columns(header, ANSWER_ALIASES);
    if question_cols.is_empty() || answer_cols.is_empty() {
        warn!(
            header = ?header,
            "No question/answer header aliases found; every row will be dropped"
        );
    }

    let mut report = ImportReport::default();
    for row in data {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match (pick(row, &question_cols), pick(row, &answer_cols)) {
            (Some(question), Some(answer)) => {
                report.items.push(NewKnowledge::new(question, answer))
            }
            _ => report.dropped += 1,
        }
    }

    debug!(kept = report.items.len(), dropped = report.dropped, "Mapped spreadsheet rows");
    Ok(report)
}

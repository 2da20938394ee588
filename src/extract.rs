//! Upload text extraction (plain text, .docx, spreadsheets and CSV)
//!
//! Every format is reduced to numbered, trimmed, non-blank lines in document
//! order. Spreadsheet and CSV rows are rendered in the upload convention
//! `source - target1; target2` so the pair parser sees one shape only.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use docx_rs::{read_docx, DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild};
use std::io::Cursor;
use std::path::Path;

use crate::error::{Error, Result};

/// Upload container formats understood by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    /// Word processing document (.docx)
    RichText,
    /// First sheet of an .xlsx / .xls / .ods workbook
    Spreadsheet,
    Csv,
}

impl DocumentFormat {
    /// Detect the format from a file name, bare extension or MIME type
    pub fn detect(declared: &str) -> Result<Self> {
        let declared = declared.trim().to_lowercase();

        match declared.split(';').next().unwrap_or_default().trim() {
            "text/plain" => return Ok(DocumentFormat::PlainText),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                return Ok(DocumentFormat::RichText)
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel" => return Ok(DocumentFormat::Spreadsheet),
            "text/csv" => return Ok(DocumentFormat::Csv),
            _ => {}
        }

        let extension = declared.rsplit('.').next().unwrap_or_default();
        match extension {
            "txt" | "text" => Ok(DocumentFormat::PlainText),
            "docx" => Ok(DocumentFormat::RichText),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(DocumentFormat::Spreadsheet),
            "csv" => Ok(DocumentFormat::Csv),
            _ => Err(Error::UnsupportedFormat(format!(".{}", extension))),
        }
    }
}

/// A non-blank line and its 1-based position in the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLine {
    pub number: usize,
    pub text: String,
}

impl ExtractedLine {
    /// Number raw lines by position, dropping blank ones
    pub fn numbered<I, S>(lines: I) -> Vec<ExtractedLine>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .enumerate()
            .filter_map(|(i, line)| {
                let text = line.as_ref().trim();
                (!text.is_empty()).then(|| ExtractedLine {
                    number: i + 1,
                    text: text.to_string(),
                })
            })
            .collect()
    }
}

/// Read a file from disk, detecting its format from the extension
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Vec<ExtractedLine>> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let format = DocumentFormat::detect(name)?;
    let bytes = std::fs::read(path)?;
    extract_lines(&bytes, format)
}

/// Convert uploaded bytes into numbered lines
pub fn extract_lines(bytes: &[u8], format: DocumentFormat) -> Result<Vec<ExtractedLine>> {
    match format {
        DocumentFormat::PlainText => extract_plain_text(bytes),
        DocumentFormat::RichText => extract_docx(bytes),
        DocumentFormat::Spreadsheet => extract_spreadsheet(bytes),
        DocumentFormat::Csv => extract_csv(bytes),
    }
}

fn extract_plain_text(bytes: &[u8]) -> Result<Vec<ExtractedLine>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::CorruptFile(format!("text is not valid UTF-8: {}", e)))?;
    Ok(ExtractedLine::numbered(text.lines()))
}

fn extract_docx(bytes: &[u8]) -> Result<Vec<ExtractedLine>> {
    let docx = read_docx(bytes).map_err(|e| Error::CorruptFile(format!("cannot open .docx: {:?}", e)))?;

    let mut lines = Vec::new();
    let mut number = 0;
    for child in &docx.document.children {
        // Tables, section properties etc. carry no word pairs
        if let DocumentChild::Paragraph(para) = child {
            for segment in paragraph_text(para).split('\n') {
                number += 1;
                let text = segment.trim();
                if !text.is_empty() {
                    lines.push(ExtractedLine {
                        number,
                        text: text.to_string(),
                    });
                }
            }
        }
    }
    Ok(lines)
}

/// Concatenate run texts, including runs inside hyperlinks and tracked
/// insertions; soft breaks become newlines
fn paragraph_text(para: &Paragraph) -> String {
    let mut text = String::new();
    push_children_text(&para.children, &mut text);
    text
}

fn push_children_text(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(run, text),
            ParagraphChild::Hyperlink(link) => push_children_text(&link.children, text),
            ParagraphChild::Insert(insert) => {
                for ic in &insert.children {
                    if let InsertChild::Run(run) = ic {
                        push_run_text(run, text);
                    }
                }
            }
            // Deleted revisions and markers carry no visible text
            _ => {}
        }
    }
}

fn push_run_text(run: &Run, text: &mut String) {
    for rc in &run.children {
        match rc {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

fn extract_spreadsheet(bytes: &[u8]) -> Result<Vec<ExtractedLine>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::CorruptFile(format!("cannot open workbook: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::CorruptFile("no sheets found in workbook".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::CorruptFile(format!("cannot read sheet '{}': {}", sheet_name, e)))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(get_cell_string).collect::<Vec<_>>());
    Ok(rows_to_lines(rows))
}

fn extract_csv(bytes: &[u8]) -> Result<Vec<ExtractedLine>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| Error::CorruptFile(format!("cannot read CSV row: {}", e)))?;
        rows.push(record.iter().map(|s| s.trim().to_string()).collect::<Vec<_>>());
    }
    Ok(rows_to_lines(rows))
}

/// Render table rows as `first - rest; rest`, skipping blank rows and a
/// header row. The first column is always the source word: a row with an
/// empty first cell renders as ` - rest` so the parser rejects it.
fn rows_to_lines<I>(rows: I) -> Vec<ExtractedLine>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut lines = Vec::new();
    for (i, cells) in rows.into_iter().enumerate() {
        let mut cells = cells.into_iter();
        let first = cells.next().unwrap_or_default();
        let rest: Vec<String> = cells.filter(|c| !c.is_empty()).collect();
        if first.is_empty() && rest.is_empty() {
            continue;
        }
        if i == 0 && is_header_cell(&first) {
            continue;
        }
        let text = if rest.is_empty() {
            first
        } else {
            format!("{} - {}", first, rest.join("; "))
        };
        lines.push(ExtractedLine { number: i + 1, text });
    }
    lines
}

/// Column titles commonly placed above word lists
fn is_header_cell(cell: &str) -> bool {
    matches!(
        crate::model::normalize(cell).as_str(),
        "word" | "words" | "source" | "turkish" | "türkçe" | "turkce" | "turkcha" | "kelime" | "so'z"
            | "so'zlar"
    )
}

/// Helper to extract string from a spreadsheet cell
fn get_cell_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
        Data::Empty => String::new(),
    }
}

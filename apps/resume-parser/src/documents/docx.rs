use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use super::{validate_file, DocumentParser};
use crate::errors::ParserError;

/// Password-protected Office files are OLE compound documents, not zips.
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const DOCUMENT_PART: &str = "word/document.xml";

static XML_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>|[^<]+").expect("xml token pattern should compile"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(amp|lt|gt|quot|apos|#[0-9]+|#x[0-9A-Fa-f]+);")
        .expect("xml entity pattern should compile")
});

/// Word (.docx) text extraction: body paragraphs first, then table rows with
/// cells joined by `" | "`.
pub struct DocxParser {
    max_file_size_mb: u64,
}

impl DocxParser {
    pub fn new(max_file_size_mb: u64) -> Self {
        Self { max_file_size_mb }
    }
}

impl DocumentParser for DocxParser {
    fn format_name(&self) -> &'static str {
        "Word document"
    }

    fn parse(&self, path: &Path) -> Result<String, ParserError> {
        validate_file(path, self.max_file_size_mb)?;
        info!("Parsing Word document: {}", path.display());

        let bytes = std::fs::read(path)?;
        if bytes.starts_with(OLE_MAGIC) {
            warn!("Word document is encrypted: {}", path.display());
            return Err(ParserError::FileUnreadable(format!(
                "Cannot open encrypted Word document: {}. The file requires a password.",
                path.display()
            )));
        }

        let xml = read_document_part(&bytes).map_err(|e| {
            error!("Error parsing Word document {}: {}", path.display(), e);
            ParserError::FileUnreadable(format!(
                "Failed to parse Word document: {e}. The file may be corrupted"
            ))
        })?;

        let text = document_text(&xml);
        if text.trim().is_empty() {
            return Err(ParserError::FileUnreadable(format!(
                "No text content extracted from Word document: {}",
                path.display()
            )));
        }

        info!(
            "Successfully extracted {} characters from Word document",
            text.len()
        );
        Ok(text)
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String, ZipError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut part = archive.by_name(DOCUMENT_PART)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Walks the WordprocessingML body and collects paragraph and table text.
fn document_text(xml: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut table_rows: Vec<String> = Vec::new();

    let mut paragraph = String::new();
    let mut cell: Vec<String> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut table_depth = 0usize;
    let mut in_text = false;

    for token in XML_TOKEN.find_iter(xml).map(|m| m.as_str()) {
        let Some(tag) = token.strip_prefix('<') else {
            if in_text {
                paragraph.push_str(&unescape(token));
            }
            continue;
        };

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with("/>");
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .next()
            .unwrap_or_default();

        match (name, closing) {
            ("w:t", false) => in_text = !self_closing,
            ("w:t", true) => in_text = false,
            ("w:tab", false) => paragraph.push('\t'),
            ("w:br" | "w:cr", false) => paragraph.push('\n'),
            ("w:p", true) => {
                let text = std::mem::take(&mut paragraph);
                if text.trim().is_empty() {
                    continue;
                }
                if table_depth > 0 {
                    cell.push(text);
                } else {
                    paragraphs.push(text);
                }
            }
            ("w:tbl", false) => table_depth += 1,
            ("w:tbl", true) => table_depth = table_depth.saturating_sub(1),
            ("w:tc", true) if table_depth == 1 => {
                let text = std::mem::take(&mut cell).join("\n");
                if !text.trim().is_empty() {
                    row.push(text);
                }
            }
            ("w:tr", true) if table_depth == 1 => {
                let cells = std::mem::take(&mut row);
                if !cells.is_empty() {
                    table_rows.push(cells.join(" | "));
                }
            }
            _ => {}
        }
    }

    paragraphs.extend(table_rows);
    paragraphs.join("\n")
}

fn unescape(raw: &str) -> String {
    ENTITY
        .replace_all(raw, |caps: &regex::Captures| {
            let entity = &caps[1];
            match entity {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                        .map(String::from)
                        .unwrap_or_else(|| caps[0].to_string())
                }
            }
        })
        .into_owned()
}

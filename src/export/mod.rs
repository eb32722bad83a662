//! @acp:module "Exporter"
//! @acp:summary "Write generated questions to an xlsx workbook"
//! @acp:domain export
//! @acp:layer io
//!
//! Produces a minimal SpreadsheetML package: content types, relationships,
//! a workbook part and one worksheet per sheet. Every cell is written as an
//! inline string so no shared-string table is needed.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{QgenError, Result};
use crate::llm::MarkdownRecord;

/// Header row of the exported question sheet
pub const MARKDOWN_HEADERS: [&str; 2] = ["question_markdown", "answer_markdown"];

const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// One worksheet worth of string cells; empty strings leave the cell blank
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Write the formatted question list, one row per record.
///
/// Parent directories are created; an existing file is overwritten.
pub fn write_markdown_records(path: &Path, records: &[MarkdownRecord]) -> Result<PathBuf> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(MARKDOWN_HEADERS.iter().map(|h| h.to_string()).collect());
    for record in records {
        rows.push(vec![
            record.question_markdown.clone(),
            record.answer_markdown.clone(),
        ]);
    }
    write_workbook(path, &[SheetData::new(DEFAULT_SHEET_NAME, rows)])?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(path.to_path_buf())
}

/// Write a multi-sheet workbook to `path`
pub fn write_workbook(path: &Path, sheets: &[SheetData]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let fallback = [SheetData::new(DEFAULT_SHEET_NAME, Vec::new())];
    let sheets = if sheets.is_empty() { &fallback[..] } else { sheets };

    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut put = |name: &str, body: String| -> Result<()> {
        zip.start_file(name, options.clone()).map_err(zip_error)?;
        zip.write_all(body.as_bytes())?;
        Ok(())
    };

    put("[Content_Types].xml", content_types(sheets.len()))?;
    put("_rels/.rels", ROOT_RELS.to_string())?;
    put("docProps/core.xml", core_properties())?;
    put("xl/workbook.xml", workbook_xml(sheets))?;
    put("xl/_rels/workbook.xml.rels", workbook_rels(sheets.len()))?;
    for (i, sheet) in sheets.iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", i + 1), worksheet_xml(&sheet.rows))?;
    }

    zip.finish().map_err(zip_error)?;
    Ok(())
}

fn zip_error(e: zip::result::ZipError) -> QgenError {
    QgenError::Export(e.to_string())
}

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"</Relationships>"#
);

fn content_types(sheet_count: usize) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        ));
    }
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str("</Types>");
    xml
}

fn core_properties() -> String {
    format!(
        concat!(
            r#"{}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<dc:creator>qgen</dc:creator>"#,
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
            r#"</cp:coreProperties>"#
        ),
        XML_DECL,
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    )
}

fn workbook_xml(sheets: &[SheetData]) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#);
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(&sheet_name(&sheet.name, i)),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i, i
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn worksheet_xml(rows: &[Vec<String>]) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);

    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if width > 0 {
        xml.push_str(&format!(
            r#"<dimension ref="A1:{}{}"/>"#,
            column_letter(width - 1),
            rows.len()
        ));
    }

    xml.push_str("<sheetData>");
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            xml.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_letter(c),
                r + 1,
                escape(value)
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Zero-based column index to spreadsheet letters (0 -> A, 26 -> AA)
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Sheet names are capped at 31 chars and may not contain `[]:*?/\`
fn sheet_name(name: &str, index: usize) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        format!("Sheet{}", index + 1)
    } else {
        cleaned
    }
}

fn escape(value: &str) -> String {
    let legal: String = value
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .collect();
    quick_xml::escape::escape(legal.as_str()).into_owned()
}

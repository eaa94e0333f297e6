//! DOCX text extraction: body paragraphs first, then table cells.
//!
//! Reads `word/document.xml` straight out of the zip container and walks it with a
//! streaming XML reader. Only top-level content is collected: paragraphs that sit directly in
//! the body, and cells of top-level tables (row-major). Nested tables and text boxes are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

pub fn extract_docx_text(path: &Path) -> Result<String, ExtractError> {
    debug!("Extracting DOCX: {:?}", path);

    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;

    let content = parse_document_xml(&xml)?;
    Ok(content.into_text())
}

#[derive(Debug, Default, PartialEq)]
struct DocxContent {
    paragraphs: Vec<String>,
    cells: Vec<String>,
}

impl DocxContent {
    fn into_text(self) -> String {
        self.paragraphs
            .into_iter()
            .chain(self.cells)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Default)]
struct WalkState {
    table_depth: usize,
    paragraph_depth: usize,
    run_depth: usize,
    in_text: bool,
    paragraph: Option<String>,
    cell: Option<Vec<String>>,
}

impl WalkState {
    fn push(&mut self, s: &str) {
        if self.paragraph_depth == 1 && self.run_depth > 0 {
            if let Some(p) = self.paragraph.as_mut() {
                p.push_str(s);
            }
        }
    }
}

fn parse_document_xml(xml: &str) -> Result<DocxContent, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut state = WalkState::default();
    let mut content = DocxContent::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => state.table_depth += 1,
                b"tc" if state.table_depth == 1 => state.cell = Some(Vec::new()),
                b"p" => {
                    state.paragraph_depth += 1;
                    let top_level = state.table_depth == 0
                        || (state.table_depth == 1 && state.cell.is_some());
                    if state.paragraph_depth == 1 && top_level {
                        state.paragraph = Some(String::new());
                    }
                }
                b"r" => state.run_depth += 1,
                b"t" => state.in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => state.push("\t"),
                b"br" | b"cr" => state.push("\n"),
                _ => {}
            },
            Event::Text(t) => {
                if state.in_text {
                    let text = t.unescape()?;
                    state.push(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => state.in_text = false,
                b"r" => state.run_depth = state.run_depth.saturating_sub(1),
                b"p" => {
                    if state.paragraph_depth == 1 {
                        if let Some(text) = state.paragraph.take() {
                            match state.cell.as_mut() {
                                Some(cell) => cell.push(text),
                                None if !text.trim().is_empty() => content.paragraphs.push(text),
                                None => {}
                            }
                        }
                    }
                    state.paragraph_depth = state.paragraph_depth.saturating_sub(1);
                }
                b"tc" if state.table_depth == 1 => {
                    if let Some(cell) = state.cell.take() {
                        let text = cell.join("\n");
                        if !text.trim().is_empty() {
                            content.cells.push(text);
                        }
                    }
                }
                b"tbl" => state.table_depth = state.table_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(content)
}

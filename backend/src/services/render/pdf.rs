//! Converts a rendered form document into a PDF with genpdf.
//!
//! The intermediate document is line oriented:
//! - an empty line is a vertical break,
//! - `# ` starts a centered bold heading and `## ` a bold sub-heading,
//! - `- ` starts a bulleted item,
//! - consecutive lines starting with `|` form a framed table (`| [22] | Thuế kỳ trước | 1.000 |`),
//! - anything else is a paragraph with inline `***bold italic***`, `**bold**` and `*italic*`.
//!
//! A backslash makes the next character literal: `\|` does not split a cell and `\*` does not
//! start a style. Filled-in values arrive escaped this way (see `template::escape_value`).

use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::style::{Style, StyledString};
use genpdf::{Alignment, Document, Element as _};
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BASE_FONT_SIZE: u8 = 10;
const HEADING_FONT_SIZE: u8 = 14;
const SUBHEADING_FONT_SIZE: u8 = 11;
const PAGE_MARGIN_MM: i32 = 10;
const MAX_COLUMN_WEIGHT: usize = 12;
const ESCAPE: char = '\\';

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read rendered document {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no usable font family in {}: {reason}", dir.display())]
    Fonts { dir: PathBuf, reason: String },

    #[error("failed to lay out document: {0}")]
    Layout(String),

    #[error("failed to write PDF {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

/// Fragments with detected styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextSegment {
    text: String,
    style: TextStyle,
}

/// One logical block of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Blank,
    Heading(String),
    SubHeading(String),
    ListItem(String),
    Table(Vec<Vec<String>>),
    Text(String),
}

/// Converts rendered documents into PDFs using fonts from one directory.
#[derive(Debug, Clone)]
pub struct PdfConverter {
    font_dir: PathBuf,
}

impl PdfConverter {
    pub fn new(font_dir: impl Into<PathBuf>) -> Self {
        Self {
            font_dir: font_dir.into(),
        }
    }

    /// Reads `input`, lays it out and writes the PDF to `output`, creating parent directories.
    pub fn convert(&self, input: &Path, output: &Path, title: &str) -> Result<(), ConvertError> {
        let text = fs::read_to_string(input).map_err(|source| ConvertError::Read {
            path: input.to_path_buf(),
            source,
        })?;

        let mut doc = self.configure_document(title)?;
        for block in parse_blocks(&text) {
            push_block(&mut doc, block)?;
        }

        let write_err = |reason: String| ConvertError::Write {
            path: output.to_path_buf(),
            reason,
        };
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let mut out_file = fs::File::create(output).map_err(|e| write_err(e.to_string()))?;
        doc.render(&mut out_file)
            .map_err(|e| write_err(e.to_string()))?;

        info!("wrote {}", output.display());
        Ok(())
    }

    /// Load the font family: Arial if its TTFs are present, LiberationSans otherwise.
    fn load_font(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, ConvertError> {
        if let Ok(family) = genpdf::fonts::from_files(&self.font_dir, "Arial", None) {
            return Ok(family);
        }
        genpdf::fonts::from_files(&self.font_dir, "LiberationSans", None).map_err(|e| {
            ConvertError::Fonts {
                dir: self.font_dir.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// Configure and return a genpdf Document with font and decorator set.
    fn configure_document(&self, title: &str) -> Result<Document, ConvertError> {
        let font_family = self.load_font()?;
        let mut doc = Document::new(font_family);
        doc.set_title(title);
        doc.set_font_size(BASE_FONT_SIZE);
        doc.set_line_spacing(1.15);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(PAGE_MARGIN_MM);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }
}

/// Groups document lines into blocks. Consecutive `|` lines become one table.
fn parse_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut table: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        // Do not trim the whole line: leading spaces are part of the layout.
        let trimmed_end = line.trim_end();
        if let Some(row) = trimmed_end.trim_start().strip_prefix('|') {
            table.push(split_row(row));
            continue;
        }
        if !table.is_empty() {
            blocks.push(Block::Table(std::mem::take(&mut table)));
        }

        let block = if trimmed_end.is_empty() {
            Block::Blank
        } else if let Some(rest) = trimmed_end.strip_prefix("## ") {
            Block::SubHeading(unescape(rest))
        } else if let Some(rest) = trimmed_end.strip_prefix("# ") {
            Block::Heading(unescape(rest))
        } else if let Some(rest) = trimmed_end.strip_prefix("- ") {
            Block::ListItem(rest.to_string())
        } else {
            Block::Text(trimmed_end.to_string())
        };
        blocks.push(block);
    }
    if !table.is_empty() {
        blocks.push(Block::Table(table));
    }
    blocks
}

/// Splits a table row on unescaped `|`. Cells keep their escapes for `parse_styles`.
fn split_row(row: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut rest = row;
    while let Some(at) = find_unescaped(rest, "|") {
        cells.push(rest[..at].trim().to_string());
        rest = &rest[at + 1..];
    }
    if !rest.trim().is_empty() {
        cells.push(rest.trim().to_string());
    }
    cells
}

/// Byte offset of the first `needle` that is not escaped.
fn find_unescaped(haystack: &str, needle: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in haystack.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if haystack[i..].starts_with(needle) {
            return Some(i);
        }
    }
    None
}

/// Drops the backslash of every escaped pair. A trailing lone backslash is kept.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            out.push(chars.next().unwrap_or(ESCAPE));
        } else {
            out.push(c);
        }
    }
    out
}

/// Column weights proportional to the widest cell of each column.
fn column_weights(rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|col| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            (widest / 6).clamp(1, MAX_COLUMN_WEIGHT)
        })
        .collect()
}

/// Amount-like cells (`1.234.567`, `-500`, `0`) are right-aligned.
fn is_amount(cell: &str) -> bool {
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn push_block(doc: &mut Document, block: Block) -> Result<(), ConvertError> {
    match block {
        Block::Blank => doc.push(Break::new(1)),
        Block::Heading(text) => doc.push(
            Paragraph::new(StyledString::new(
                text,
                Style::new().bold().with_font_size(HEADING_FONT_SIZE),
            ))
            .aligned(Alignment::Center),
        ),
        Block::SubHeading(text) => doc.push(Paragraph::new(StyledString::new(
            text,
            Style::new().bold().with_font_size(SUBHEADING_FONT_SIZE),
        ))),
        Block::ListItem(text) => handle_list_item(doc, &text),
        Block::Table(rows) => handle_table(doc, &rows)?,
        Block::Text(text) => handle_normal_line(doc, &text),
    }
    Ok(())
}

/// Handle a list item line starting with `- `.
fn handle_list_item(doc: &mut Document, item_text: &str) {
    let mut p = Paragraph::new("");
    p.push(StyledString::new("• ", Style::new()));
    push_segments_into_paragraph(&mut p, &parse_styles(item_text));
    let mut layout = LinearLayout::vertical();
    layout.push(p);
    doc.push(layout);
}

/// Handle a normal text line (may contain inline styles).
fn handle_normal_line(doc: &mut Document, line: &str) {
    let mut p = Paragraph::new("");
    push_segments_into_paragraph(&mut p, &parse_styles(line));
    doc.push(p);
}

fn handle_table(doc: &mut Document, rows: &[Vec<String>]) -> Result<(), ConvertError> {
    let weights = column_weights(rows);
    let columns = weights.len();
    let mut table = TableLayout::new(weights);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    for row in rows {
        let mut table_row = table.row();
        for col in 0..columns {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            let mut p = Paragraph::new("");
            push_segments_into_paragraph(&mut p, &parse_styles(cell));
            if is_amount(&unescape(cell)) {
                p.set_alignment(Alignment::Right);
            }
            table_row = table_row.element(p.padded(1));
        }
        table_row
            .push()
            .map_err(|e| ConvertError::Layout(e.to_string()))?;
    }
    doc.push(table);
    Ok(())
}

/// Push segments into a Paragraph converting each `TextSegment` into a `StyledString`.
fn push_segments_into_paragraph(p: &mut Paragraph, segments: &[TextSegment]) {
    for seg in segments {
        let style = match seg.style {
            TextStyle::Regular => Style::new(),
            TextStyle::Bold => Style::new().bold(),
            TextStyle::Italic => Style::new().italic(),
            TextStyle::BoldItalic => Style::new().bold().italic(),
        };
        p.push(StyledString::new(seg.text.clone(), style));
    }
}

/// Parse inline styles: `***bolditalic***`, `**bold**`, `*italic*`.
/// An opening marker without a matching closing marker is kept as literal text, and escaped
/// stars never count as markers. Segment text comes out unescaped.
fn parse_styles(line: &str) -> Vec<TextSegment> {
    const MARKERS: [(&str, TextStyle); 3] = [
        ("***", TextStyle::BoldItalic),
        ("**", TextStyle::Bold),
        ("*", TextStyle::Italic),
    ];

    let mut segments: Vec<TextSegment> = Vec::new();
    let mut push = |text: &str, style: TextStyle| {
        if text.is_empty() {
            return;
        }
        let text = unescape(text);
        match segments.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => segments.push(TextSegment { text, style }),
        }
    };

    let mut rest = line;
    while !rest.is_empty() {
        // Plain text until next unescaped '*'
        let star = find_unescaped(rest, "*").unwrap_or(rest.len());
        push(&rest[..star], TextStyle::Regular);
        rest = &rest[star..];
        if rest.is_empty() {
            break;
        }

        let mut consumed = false;
        for (marker, style) in MARKERS {
            if let Some(inner) = rest.strip_prefix(marker) {
                if let Some(end) = find_unescaped(inner, marker).filter(|&end| end > 0) {
                    push(&inner[..end], style);
                    rest = &inner[end + marker.len()..];
                    consumed = true;
                }
                break;
            }
        }
        if !consumed {
            // Unmatched run of stars is literal text.
            let run = rest.len() - rest.trim_start_matches('*').len();
            push(&rest[..run], TextStyle::Regular);
            rest = &rest[run..];
        }
    }

    segments
}

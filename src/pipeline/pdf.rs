//! PDF writer.
//!
//! Lays a [`Document`] out on A4 pages and assembles the file by hand:
//! header, catalog, page tree, two standard Type1 fonts, one content stream
//! per page, info dictionary, xref table and trailer.
//!
//! Layout follows a simple flow model. A cursor moves down the page; every
//! call to [`TextFlow::paragraph`] wraps its text to the content width and
//! starts a new page whenever the next line would cross the bottom margin.
//! `move_down(n)` advances the cursor by `n` line heights of the current font
//! size.

use super::fonts::{pdf_literal, Font};
use super::layout::{Block, Document};
use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// A4 in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 20.0;
const META_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;

// Fixed object numbers; pages follow as (page, content) pairs.
const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const INFO_ID: usize = 5;
const FIRST_PAGE_ID: usize = 6;

fn font_id(font: Font) -> usize {
    match font {
        Font::Regular => 3,
        Font::Bold => 4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    /// Stretch inter-word spacing to the full width, except on a
    /// paragraph's last line.
    Justify,
}

/// Document-level metadata written to the info dictionary.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub subject: String,
    pub created: DateTime<Utc>,
}

/// Render `doc` to a complete PDF file.
pub fn render_pdf(doc: &Document<'_>, compress: bool) -> io::Result<Vec<u8>> {
    let pages = layout_pages(doc);
    let info = DocumentInfo {
        title: doc.title.to_string(),
        subject: doc.source_url.to_string(),
        created: Utc::now(),
    };
    write_pdf(&pages, &info, compress)
}

/// Lay the document out and return one raw content stream per page.
pub fn layout_pages(doc: &Document<'_>) -> Vec<String> {
    let mut flow = TextFlow::new();

    flow.font(Font::Bold, TITLE_SIZE);
    flow.paragraph(doc.title, Align::Center);
    flow.move_down(1.0);

    flow.font(Font::Regular, META_SIZE);
    flow.paragraph(&doc.source_line(), Align::Center);
    flow.paragraph(&doc.generated_line(), Align::Center);
    flow.move_down(2.0);

    flow.font(Font::Regular, BODY_SIZE);
    for block in doc.blocks() {
        match block {
            Block::Heading(text) => {
                flow.font(Font::Bold, HEADING_SIZE);
                flow.paragraph(text, Align::Left);
                flow.move_down(0.5);
                flow.font(Font::Regular, BODY_SIZE);
            }
            Block::Body(text) => {
                flow.paragraph(text, Align::Justify);
                flow.move_down(0.3);
            }
            Block::Blank => flow.move_down(0.5),
        }
    }

    flow.finish()
}

/// Cursor-based text layout over a growing list of pages.
pub struct TextFlow {
    pages: Vec<String>,
    /// Distance of the cursor from the top edge of the page.
    y: f32,
    font: Font,
    size: f32,
}

impl Default for TextFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFlow {
    pub fn new() -> Self {
        Self {
            pages: vec![String::new()],
            y: MARGIN,
            font: Font::Regular,
            size: BODY_SIZE,
        }
    }

    pub fn font(&mut self, font: Font, size: f32) {
        self.font = font;
        self.size = size;
    }

    pub fn move_down(&mut self, lines: f32) {
        self.y += Font::line_height(self.size) * lines;
    }

    pub fn paragraph(&mut self, text: &str, align: Align) {
        let lines = wrap(text, self.font, self.size, CONTENT_WIDTH);
        let count = lines.len();
        for (i, line) in lines.iter().enumerate() {
            self.draw_line(line, align, i + 1 == count);
        }
    }

    pub fn finish(self) -> Vec<String> {
        self.pages
    }

    fn draw_line(&mut self, line: &str, align: Align, last: bool) {
        let line_height = Font::line_height(self.size);
        if self.y + line_height > PAGE_HEIGHT - MARGIN && self.y > MARGIN {
            self.pages.push(String::new());
            self.y = MARGIN;
        }

        let width = self.font.text_width(line, self.size);
        let gaps = line.matches(' ').count();
        let (x, word_spacing) = match align {
            Align::Left => (MARGIN, 0.0),
            Align::Center => (MARGIN + (CONTENT_WIDTH - width).max(0.0) / 2.0, 0.0),
            Align::Justify if !last && gaps > 0 => {
                (MARGIN, (CONTENT_WIDTH - width).max(0.0) / gaps as f32)
            }
            Align::Justify => (MARGIN, 0.0),
        };
        let baseline = PAGE_HEIGHT - self.y - Font::ascent(self.size);

        let ops = format!(
            "BT\n/{} {} Tf\n{:.3} Tw\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            self.font.resource_name(),
            self.size,
            word_spacing,
            x,
            baseline,
            pdf_literal(line)
        );
        if let Some(page) = self.pages.last_mut() {
            page.push_str(&ops);
        }
        self.y += line_height;
    }
}

/// Greedy line breaking on whitespace. Words wider than `width` are split
/// between characters.
pub fn wrap(text: &str, font: Font, size: f32, width: f32) -> Vec<String> {
    let space = font.text_width(" ", size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        for piece in split_long_word(word, font, size, width) {
            let w = font.text_width(&piece, size);
            if current.is_empty() {
                current = piece;
                current_width = w;
            } else if current_width + space + w <= width {
                current.push(' ');
                current.push_str(&piece);
                current_width += space + w;
            } else {
                lines.push(std::mem::take(&mut current));
                current = piece;
                current_width = w;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_long_word(word: &str, font: Font, size: f32, width: f32) -> Vec<String> {
    if font.text_width(word, size) <= width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_width = 0.0;
    let mut buf = [0u8; 4];
    for ch in word.chars() {
        let w = font.text_width(ch.encode_utf8(&mut buf), size);
        if !piece.is_empty() && piece_width + w > width {
            pieces.push(std::mem::take(&mut piece));
            piece_width = 0.0;
        }
        piece.push(ch);
        piece_width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

fn compress_data(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Assemble a PDF file from raw page content streams.
pub fn write_pdf(pages: &[String], info: &DocumentInfo, compress: bool) -> io::Result<Vec<u8>> {
    let object_count = FIRST_PAGE_ID + 2 * pages.len();
    let mut offsets = vec![0usize; object_count];
    let mut out = Vec::new();

    writeln!(out, "%PDF-1.4")?;
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    begin_object(&mut out, &mut offsets, CATALOG_ID)?;
    writeln!(out, "<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID)?;
    end_object(&mut out)?;

    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_ID + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    begin_object(&mut out, &mut offsets, PAGES_ID)?;
    writeln!(
        out,
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids,
        pages.len()
    )?;
    end_object(&mut out)?;

    for font in Font::ALL {
        begin_object(&mut out, &mut offsets, font_id(font))?;
        writeln!(
            out,
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
            font.base_name()
        )?;
        end_object(&mut out)?;
    }

    begin_object(&mut out, &mut offsets, INFO_ID)?;
    writeln!(
        out,
        "<< /Title ({}) /Subject ({}) /Creator (web2doc) /Producer (web2doc {}) /CreationDate ({}) >>",
        pdf_literal(&info.title),
        pdf_literal(&info.subject),
        env!("CARGO_PKG_VERSION"),
        info.created.format("D:%Y%m%d%H%M%SZ")
    )?;
    end_object(&mut out)?;

    let font_resources = Font::ALL
        .iter()
        .map(|f| format!("/{} {} 0 R", f.resource_name(), font_id(*f)))
        .collect::<Vec<_>>()
        .join(" ");

    for (i, content) in pages.iter().enumerate() {
        let page_id = FIRST_PAGE_ID + 2 * i;
        let content_id = page_id + 1;

        begin_object(&mut out, &mut offsets, page_id)?;
        writeln!(
            out,
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources << /Font << {} >> >> /Contents {} 0 R >>",
            PAGES_ID, PAGE_WIDTH, PAGE_HEIGHT, font_resources, content_id
        )?;
        end_object(&mut out)?;

        let (bytes, filter) = if compress {
            (compress_data(content.as_bytes())?, " /Filter /FlateDecode")
        } else {
            (content.as_bytes().to_vec(), "")
        };
        begin_object(&mut out, &mut offsets, content_id)?;
        writeln!(out, "<< /Length {}{} >>", bytes.len(), filter)?;
        writeln!(out, "stream")?;
        out.extend_from_slice(&bytes);
        writeln!(out, "\nendstream")?;
        end_object(&mut out)?;
    }

    let xref_start = out.len();
    writeln!(out, "xref")?;
    writeln!(out, "0 {}", object_count)?;
    writeln!(out, "0000000000 65535 f ")?;
    for offset in offsets.iter().skip(1) {
        writeln!(out, "{:010} 00000 n ", offset)?;
    }
    writeln!(out, "trailer")?;
    writeln!(
        out,
        "<< /Size {} /Root {} 0 R /Info {} 0 R >>",
        object_count, CATALOG_ID, INFO_ID
    )?;
    writeln!(out, "startxref")?;
    writeln!(out, "{}", xref_start)?;
    write!(out, "%%EOF")?;

    Ok(out)
}

fn begin_object(out: &mut Vec<u8>, offsets: &mut [usize], id: usize) -> io::Result<()> {
    offsets[id] = out.len();
    writeln!(out, "{} 0 obj", id)
}

fn end_object(out: &mut Vec<u8>) -> io::Result<()> {
    writeln!(out, "endobj")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn doc(text: &str) -> Document<'_> {
        Document {
            title: "Sample Title",
            text,
            source_url: "https://example.com/page",
            generated: "10/18/2026",
        }
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn uncompressed_document_structure() {
        let bytes = render_pdf(&doc("Intro\n\nSome body text."), false).unwrap();
        let content = as_text(&bytes);

        assert!(content.starts_with("%PDF-1.4"));
        assert!(content.ends_with("%%EOF"));
        assert!(content.contains("/Type /Catalog"));
        assert!(content.contains("/Count 1"));
        assert!(content.contains("/BaseFont /Helvetica "));
        assert!(content.contains("/BaseFont /Helvetica-Bold"));
        assert!(content.contains("(Sample Title) Tj"));
        assert!(content.contains("(Source: https://example.com/page) Tj"));
        assert!(content.contains("(Generated: 10/18/2026) Tj"));
        assert!(content.contains("(Some body text.) Tj"));
        assert!(content.contains("/Subject (https://example.com/page)"));
    }

    #[test]
    fn headings_use_bold_font() {
        let pages = layout_pages(&doc("Getting Started\n\nplain words here."));
        let page = &pages[0];
        let heading_at = page.find("(Getting Started) Tj").unwrap();
        let before = &page[..heading_at];
        let last_tf = before.rfind(" Tf").unwrap();
        assert!(before[..last_tf].ends_with("/F2 14"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        // Offsets are byte positions; the binary marker line is not UTF-8.
        let bytes = render_pdf(&doc("Body."), false).unwrap();

        let startxref = bytes
            .windows(10)
            .rposition(|w| w == b"startxref\n")
            .unwrap();
        let tail = std::str::from_utf8(&bytes[startxref + 10..]).unwrap();
        let xref_at: usize = tail.lines().next().unwrap().parse().unwrap();

        let table = std::str::from_utf8(&bytes[xref_at..]).unwrap();
        assert!(table.starts_with("xref"));

        let entries: Vec<usize> = table
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), FIRST_PAGE_ID + 1);
        for (i, offset) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert!(bytes[*offset..].starts_with(expected.as_bytes()));
        }
    }

    #[test]
    fn long_text_breaks_across_pages() {
        let paragraph = "lorem ipsum dolor sit amet consectetur adipiscing elit. ".repeat(40);
        let text = vec![paragraph.as_str(); 12].join("\n");
        let pages = layout_pages(&doc(&text));
        assert!(pages.len() > 1);

        let bytes = write_pdf(&pages, &info(), false).unwrap();
        assert!(as_text(&bytes).contains(&format!("/Count {}", pages.len())));
    }

    #[test]
    fn justified_lines_stretch_except_the_last() {
        let text = "word ".repeat(200);
        let mut flow = TextFlow::new();
        flow.paragraph(text.trim(), Align::Justify);
        let page = &flow.finish()[0];

        let spacings: Vec<f32> = page
            .lines()
            .filter(|l| l.ends_with(" Tw"))
            .map(|l| l.trim_end_matches(" Tw").parse().unwrap())
            .collect();
        assert!(spacings.len() > 1);
        assert!(spacings[..spacings.len() - 1].iter().all(|s| *s > 0.0));
        assert_eq!(*spacings.last().unwrap(), 0.0);
    }

    #[test]
    fn compressed_streams_inflate_back() {
        let bytes = render_pdf(&doc("Compressed body."), true).unwrap();
        let content = as_text(&bytes);
        assert!(content.contains("/Filter /FlateDecode"));
        assert!(!content.contains("(Compressed body.) Tj"));

        let start = bytes
            .windows(7)
            .position(|w| w == b"stream\n")
            .unwrap()
            + 7;
        let end = bytes
            .windows(10)
            .position(|w| w == b"\nendstream")
            .unwrap();
        let mut decoded = String::new();
        ZlibDecoder::new(&bytes[start..end])
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.contains("(Compressed body.) Tj"));
    }

    #[test]
    fn wrap_respects_width_and_splits_long_words() {
        let lines = wrap("aaa bbb ccc", Font::Regular, 12.0, 50.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Regular.text_width(line, 12.0) <= 50.0);
        }

        let long = "x".repeat(500);
        let lines = wrap(&long, Font::Regular, 12.0, CONTENT_WIDTH);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), long);
    }

    #[test]
    fn empty_body_still_produces_one_page() {
        let pages = layout_pages(&doc(""));
        assert_eq!(pages.len(), 1);
    }

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "T".into(),
            subject: "S".into(),
            created: Utc::now(),
        }
    }
}

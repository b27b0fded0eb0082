//! DOCX writer.
//!
//! A DOCX file is a ZIP archive of Open XML parts. Only the minimum package
//! is written: content types, package relationships, core properties and a
//! single `word/document.xml` whose paragraphs mirror the PDF layout (centred
//! bold title, small centred source and date lines, bold headings, justified
//! body text).

use super::layout::{Block, Document};
use chrono::{DateTime, Utc};
use std::io::{Seek, Write};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

// Run sizes are in half-points.
const TITLE_SIZE: u32 = 40;
const META_SIZE: u32 = 20;
const HEADING_SIZE: u32 = 28;
const BODY_SIZE: u32 = 24;

/// 50 pt page margins in twentieths of a point.
const MARGIN_TWIPS: u32 = 1000;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Justification {
    Left,
    Center,
    Both,
}

impl Justification {
    fn as_str(self) -> &'static str {
        match self {
            Justification::Left => "left",
            Justification::Center => "center",
            Justification::Both => "both",
        }
    }
}

/// Write `doc` as a DOCX package into `writer` and return the writer.
pub fn write_docx<W: Write + Seek>(writer: W, doc: &Document<'_>) -> ZipResult<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;

    zip.start_file("docProps/core.xml", options)?;
    zip.write_all(core_properties(doc, Utc::now()).as_bytes())?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(document_xml(doc).as_bytes())?;

    zip.finish()
}

fn core_properties(doc: &Document<'_>, created: DateTime<Utc>) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{}</dc:title><dc:description>{}</dc:description><dc:creator>web2doc</dc:creator>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
            "</cp:coreProperties>"
        ),
        escape_xml(doc.title),
        escape_xml(&doc.source_line()),
        created.format("%Y-%m-%dT%H:%M:%SZ")
    )
}

/// The main document part.
pub fn document_xml(doc: &Document<'_>) -> String {
    let mut body = String::new();

    body.push_str(&paragraph(doc.title, Justification::Center, true, TITLE_SIZE, 240));
    body.push_str(&paragraph(&doc.source_line(), Justification::Center, false, META_SIZE, 0));
    body.push_str(&paragraph(&doc.generated_line(), Justification::Center, false, META_SIZE, 480));

    for block in doc.blocks() {
        match block {
            Block::Heading(text) => {
                body.push_str(&paragraph(text, Justification::Left, true, HEADING_SIZE, 120))
            }
            Block::Body(text) => {
                body.push_str(&paragraph(text, Justification::Both, false, BODY_SIZE, 80))
            }
            Block::Blank => body.push_str("<w:p/>"),
        }
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
            "{}",
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
            r#"<w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="0" w:footer="0" w:gutter="0"/>"#,
            "</w:sectPr></w:body></w:document>"
        ),
        body,
        m = MARGIN_TWIPS
    )
}

fn paragraph(text: &str, jc: Justification, bold: bool, size: u32, after: u32) -> String {
    format!(
        concat!(
            r#"<w:p><w:pPr><w:jc w:val="{jc}"/><w:spacing w:after="{after}"/></w:pPr>"#,
            r#"<w:r><w:rPr><w:rFonts w:ascii="Helvetica" w:hAnsi="Helvetica"/>{bold}<w:sz w:val="{size}"/></w:rPr>"#,
            r#"<w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
        ),
        jc = jc.as_str(),
        after = after,
        bold = if bold { "<w:b/>" } else { "" },
        size = size,
        text = escape_xml(text)
    )
}

/// Escape markup characters and drop code points XML 1.0 cannot carry.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if (c as u32) < 0x20 || c == '\u{fffe}' || c == '\u{ffff}' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn doc(text: &str) -> Document<'_> {
        Document {
            title: "Fish & Chips",
            text,
            source_url: "https://example.com/?a=1&b=2",
            generated: "10/18/2026",
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn package_contains_required_parts() {
        let out = write_docx(Cursor::new(Vec::new()), &doc("Body.")).unwrap();
        let bytes = out.into_inner();
        assert!(bytes.starts_with(b"PK"));

        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "docProps/core.xml",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }
    }

    #[test]
    fn document_text_is_escaped_and_styled() {
        let out = write_docx(Cursor::new(Vec::new()), &doc("Overview\n\na < b and c > d.")).unwrap();
        let xml = read_part(&out.into_inner(), "word/document.xml");

        assert!(xml.contains("Fish &amp; Chips"));
        assert!(xml.contains("Source: https://example.com/?a=1&amp;b=2"));
        assert!(xml.contains("Generated: 10/18/2026"));
        assert!(xml.contains("a &lt; b and c &gt; d."));

        let heading = xml.find(">Overview<").unwrap();
        let para_start = xml[..heading].rfind("<w:p>").unwrap();
        assert!(xml[para_start..heading].contains("<w:b/>"));
        assert!(xml[para_start..heading].contains(r#"<w:sz w:val="28"/>"#));

        let body = xml.find("a &lt; b").unwrap();
        let para_start = xml[..body].rfind("<w:p>").unwrap();
        assert!(xml[para_start..body].contains(r#"<w:jc w:val="both"/>"#));
    }

    #[test]
    fn blank_lines_become_empty_paragraphs() {
        let xml = document_xml(&doc("one.\n\ntwo."));
        assert_eq!(xml.matches("<w:p/>").count(), 1);
    }

    #[test]
    fn core_properties_carry_title() {
        let out = write_docx(Cursor::new(Vec::new()), &doc("x.")).unwrap();
        let core = read_part(&out.into_inner(), "docProps/core.xml");
        assert!(core.contains("<dc:title>Fish &amp; Chips</dc:title>"));
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(escape_xml("a\u{1}b\tc"), "ab\tc");
    }
}

/*!
 * Exporters for paginated scan results
 *
 * JSON and YAML carry the full page structure. XML writes one `<page>` per
 * page. CSV deliberately writes only the first page's files, one row each.
 *
 * XML field values round-trip exactly: carriage returns are written as
 * `&#13;`, and a value holding characters XML 1.0 cannot represent at all
 * (most C0 controls) is written as lowercase hex of its UTF-8 bytes with an
 * `encoding="hex"` attribute on the element.
 */

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, info};

use crate::error::{DumpError, Result};
use crate::types::{FileRecord, Page, PaginatedFiles};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    Json,
    Csv,
    Xml,
    Yaml,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
        }
    }

    /// `<base>.<extension>`
    pub fn output_path(&self, base: &Path) -> PathBuf {
        let mut name = base.as_os_str().to_owned();
        name.push(".");
        name.push(self.extension());
        PathBuf::from(name)
    }
}

/// CSV column order
pub const CSV_HEADER: [&str; 7] = [
    "name",
    "path",
    "size",
    "created_at",
    "modified_at",
    "metadata",
    "content",
];

/// Export `data` in the format named by `format` next to `base`
///
/// Unknown format names fail before any file is created.
pub fn export(data: &PaginatedFiles, format: &str, base: &Path) -> Result<PathBuf> {
    let format = OutputFormat::from_str(format)
        .map_err(|_| DumpError::UnsupportedFormat(format.to_string()))?;
    Exporter::new(format).export(data, base)
}

/// Writes a [`PaginatedFiles`] in one format
pub struct Exporter {
    format: OutputFormat,
}

impl Exporter {
    /// Create a new exporter
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write the export to `<base>.<ext>` and return that path
    pub fn export(&self, data: &PaginatedFiles, base: &Path) -> Result<PathBuf> {
        let path = self.format.output_path(base);
        let file = File::create(&path)?;
        let mut out = BufWriter::new(file);

        match self.format {
            OutputFormat::Json => self.write_json(data, &mut out)?,
            OutputFormat::Csv => self.write_csv(data, &mut out)?,
            OutputFormat::Xml => self.write_xml(data, &mut out)?,
            OutputFormat::Yaml => self.write_yaml(data, &mut out)?,
        }

        out.flush()?;
        info!(path = %path.display(), format = %self.format, "Export written");
        Ok(path)
    }

    fn write_json<W: Write>(&self, data: &PaginatedFiles, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, data)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_yaml<W: Write>(&self, data: &PaginatedFiles, out: &mut W) -> Result<()> {
        serde_yaml::to_writer(out, data)?;
        Ok(())
    }

    /// Only the first page is written
    fn write_csv<W: Write>(&self, data: &PaginatedFiles, out: &mut W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(CSV_HEADER)?;

        let first_page = data.pages.first().map(|p| p.files.as_slice()).unwrap_or(&[]);
        if data.pages.len() > 1 {
            debug!(
                omitted_pages = data.pages.len() - 1,
                "CSV export covers the first page only"
            );
        }

        for record in first_page {
            let size = record.size_bytes.to_string();
            let metadata = serde_json::to_string(&record.metadata)?;
            writer.write_record([
                record.name.as_str(),
                record.relative_path.as_str(),
                size.as_str(),
                record.created_at.as_str(),
                record.modified_at.as_str(),
                metadata.as_str(),
                record.content.as_str(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    fn write_xml<W: Write>(&self, data: &PaginatedFiles, out: &mut W) -> Result<()> {
        let mut xml_writer = Writer::new_with_indent(out, b' ', 2);

        xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        xml_writer.write_event(Event::Start(BytesStart::new("pages")))?;

        for page in &data.pages {
            self.write_page(page, &mut xml_writer)?;
        }

        xml_writer.write_event(Event::End(BytesEnd::new("pages")))?;
        Ok(())
    }

    /// Write a page element to XML
    fn write_page<W: Write>(&self, page: &Page, writer: &mut Writer<W>) -> Result<()> {
        let number = page.page_number.to_string();
        let total = page.total_pages.to_string();
        let mut start_tag = BytesStart::new("page");
        start_tag.push_attribute(("number", number.as_str()));
        start_tag.push_attribute(("total_pages", total.as_str()));
        writer.write_event(Event::Start(start_tag))?;

        for record in &page.files {
            self.write_file(record, writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("page")))?;
        Ok(())
    }

    /// Write a file element, one child element per field
    fn write_file<W: Write>(&self, record: &FileRecord, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("file")))?;

        write_text_element(writer, "name", &record.name)?;
        write_text_element(writer, "path", &record.relative_path)?;
        write_text_element(writer, "size", &record.size_bytes.to_string())?;
        write_text_element(writer, "created_at", &record.created_at)?;
        write_text_element(writer, "modified_at", &record.modified_at)?;
        if let Some(mime) = &record.mime_type {
            write_text_element(writer, "mime_type", mime)?;
        }
        write_text_element(writer, "metadata", &serde_json::to_string(&record.metadata)?)?;
        write_text_element(writer, "content", &record.content)?;

        writer.write_event(Event::End(BytesEnd::new("file")))?;
        Ok(())
    }
}

/// Characters allowed by the XML 1.0 `Char` production
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    let mut start = BytesStart::new(tag);
    let body = if text.chars().all(is_xml_char) {
        // Parsers fold a raw CR into LF
        escape(text).replace('\r', "&#13;")
    } else {
        start.push_attribute(("encoding", "hex"));
        hex::encode(text)
    };

    writer.write_event(Event::Start(start))?;
    // Written even when empty so the indenter keeps `<tag></tag>` on one line
    writer.write_event(Event::Text(BytesText::from_escaped(body)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

use crate::error::{MergeError, Result};
use crate::xml::XmlDocument;
use std::io::{Cursor, Read, Write};
use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// A docx container held as raw part bytes. Parts keep their original order
/// so a re-zip only differs where a part was rewritten; everything not
/// targeted by a transform round-trips verbatim.
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let cursor = Cursor::new(bytes);
        let mut archive = ZipArchive::new(cursor)?;

        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            parts.push((name, content));
        }

        Ok(Self { parts })
    }

    pub fn save(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut buffer);

        for (path, content) in &self.parts {
            let options: zip::write::FileOptions<'_, ()> =
                zip::write::FileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(path.as_str(), options)?;
            writer.write_all(content)?;
        }

        writer.finish()?;
        Ok(buffer.into_inner())
    }

    pub fn get_part(&self, path: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, content)| content.as_slice())
    }

    pub fn set_part(&mut self, path: &str, content: Vec<u8>) {
        match self.parts.iter_mut().find(|(name, _)| name == path) {
            Some((_, existing)) => *existing = content,
            None => self.parts.push((path.to_string(), content)),
        }
    }

    pub fn get_xml_part(&self, path: &str) -> Result<XmlDocument> {
        let bytes = self.get_part(path).ok_or_else(|| MergeError::MissingPart {
            part_path: path.to_string(),
        })?;
        crate::xml::parser::parse_bytes(bytes)
    }

    pub fn put_xml_part(&mut self, path: &str, doc: &XmlDocument) -> Result<()> {
        let bytes = crate::xml::builder::serialize_bytes(doc)?;
        self.set_part(path, bytes);
        Ok(())
    }

    pub fn main_document(&self) -> Result<XmlDocument> {
        self.get_xml_part(MAIN_DOCUMENT_PART)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Header and footer part names, e.g. `word/header1.xml`.
    pub fn header_footer_parts(&self) -> Vec<String> {
        self.parts
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| is_header_footer_part(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Build a minimal docx package around a main document part. Useful for
    /// exercising transforms without a real authoring tool's output.
    pub fn from_main_xml(main_xml: &[u8]) -> Result<Self> {
        let mut pkg = Self { parts: Vec::new() };
        pkg.set_part(
            "[Content_Types].xml",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#
                .to_vec(),
        );
        pkg.set_part(MAIN_DOCUMENT_PART, main_xml.to_vec());
        Ok(pkg)
    }
}

fn is_header_footer_part(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("word/") else {
        return false;
    };
    let stem = match rest.strip_suffix(".xml") {
        Some(stem) => stem,
        None => return false,
    };
    for prefix in ["header", "footer"] {
        if let Some(digits) = stem.strip_prefix(prefix) {
            return digits.chars().all(|c| c.is_ascii_digit());
        }
    }
    false
}

// src/matching/extract.rs
//! Resume download and plain-text extraction.
//!
//! The file extension picks the decoder: PDF via `pdf-extract`, DOCX by
//! unzipping `word/document.xml`. Anything else is rejected before any
//! network fetch happens.

use regex::Regex;
use reqwest::Client;
use std::io::{Cursor, Read};
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported resume format: {0}")]
    UnsupportedFormat(String),

    #[error("resume download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("resume decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
}

impl ResumeFormat {
    /// Decoder selection by URL extension (query strings ignored)
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
        if path.ends_with(".pdf") {
            Some(ResumeFormat::Pdf)
        } else if path.ends_with(".docx") {
            Some(ResumeFormat::Docx)
        } else {
            None
        }
    }
}

/// Download a resume by URL and extract its plain text
pub async fn extract_resume_text(http: &Client, url: &str) -> Result<String, ExtractError> {
    let format = ResumeFormat::from_url(url)
        .ok_or_else(|| ExtractError::UnsupportedFormat(url.to_string()))?;

    let bytes = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    debug!(url = %url, bytes = bytes.len(), format = ?format, "Resume downloaded");

    match format {
        ResumeFormat::Pdf => pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| ExtractError::Decode(format!("PDF extraction error: {}", e))),
        ResumeFormat::Docx => extract_docx_text(&bytes),
    }
}

/// Pull the text out of a DOCX archive's main document part
fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Decode(format!("not a DOCX archive: {}", e)))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Decode(format!("missing word/document.xml: {}", e)))?
        .read_to_string(&mut document_xml)
        .map_err(|e| ExtractError::Decode(format!("unreadable document.xml: {}", e)))?;

    Ok(document_xml_to_text(&document_xml))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

/// Flatten WordprocessingML into plain text: paragraph ends become newlines,
/// remaining tags are dropped, basic XML entities are decoded.
fn document_xml_to_text(xml: &str) -> String {
    let with_breaks = xml.replace("</w:p>", "\n");
    let stripped = tag_re().replace_all(&with_breaks, "");

    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .trim()
        .to_string()
}

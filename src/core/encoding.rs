//! XML encoding detection and conversion
//!
//! Detects UTF-16 input from the BOM or leading byte patterns and converts
//! it to UTF-8 up front, so the tokenizer always works on validated UTF-8.

use tracing::debug;

use crate::error::{Error, Result};

/// Detected encoding of raw XML input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        if input.len() < 2 {
            return XmlEncoding::Utf8;
        }

        match (input[0], input[1]) {
            // UTF-16 LE BOM: 0xFF 0xFE
            (0xFF, 0xFE) => XmlEncoding::Utf16Le,
            // UTF-16 BE BOM: 0xFE 0xFF
            (0xFE, 0xFF) => XmlEncoding::Utf16Be,
            // No BOM - a null next to '<' means BOM-less UTF-16
            (0x00, b'<') => XmlEncoding::Utf16Be,
            (b'<', 0x00) => XmlEncoding::Utf16Le,
            _ => XmlEncoding::Utf8,
        }
    }
}

/// Convert raw document bytes to a UTF-8 string
///
/// Strips the UTF-8 BOM if present; UTF-16 input (either endianness) is
/// decoded. Invalid sequences fail with [`Error::Encoding`].
pub fn convert_to_utf8(input: Vec<u8>) -> Result<String> {
    let encoding = XmlEncoding::detect(&input);
    if encoding != XmlEncoding::Utf8 {
        debug!("converting {} bytes of {:?} input to UTF-8", input.len(), encoding);
    }
    match encoding {
        XmlEncoding::Utf8 => {
            let body = if input.starts_with(&[0xEF, 0xBB, 0xBF]) {
                input[3..].to_vec()
            } else {
                input
            };
            String::from_utf8(body)
                .map_err(|e| Error::encoding(format!("invalid UTF-8: {}", e.utf8_error())))
        }
        XmlEncoding::Utf16Le => convert_utf16(&input, &[0xFF, 0xFE], u16::from_le_bytes),
        XmlEncoding::Utf16Be => convert_utf16(&input, &[0xFE, 0xFF], u16::from_be_bytes),
    }
}

fn convert_utf16(input: &[u8], bom: &[u8], read: fn([u8; 2]) -> u16) -> Result<String> {
    let start = if input.starts_with(bom) { 2 } else { 0 };
    let bytes = &input[start..];

    if bytes.len() % 2 != 0 {
        return Err(Error::encoding("invalid UTF-16: odd number of bytes"));
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| read([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units).map_err(|_| Error::encoding("invalid UTF-16 code unit sequence"))
}

/// Check whether an encoding named in the XML declaration is one the
/// parser actually understands
///
/// US-ASCII is a UTF-8 subset, so it passes through unchanged; anything
/// else (ISO-8859-1 and friends) is rejected rather than mis-decoded.
pub fn is_supported_encoding(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "utf-16" | "utf16" | "utf-16le" | "utf-16be" | "us-ascii" | "ascii"
    )
}

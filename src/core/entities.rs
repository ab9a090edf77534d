//! XML entity decoding and character validation
//!
//! Handles the decoding work between raw markup and handler callbacks:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - XML 1.0 Char validation (control characters, U+FFFE/U+FFFF)
//! - Line-ending normalization (CRLF and lone CR become LF)
//! - Attribute-value whitespace normalization (literal tab/newline to space)
//!
//! Undefined entity references and invalid character references are errors;
//! there is no lenient mode. Uses Cow for zero-copy when nothing needs
//! rewriting. Errors are plain messages; callers attach byte positions.

use memchr::{memchr, memchr2};
use std::borrow::Cow;

/// What kind of content is being decoded; attribute values normalize
/// whitespace, text content rejects a literal "]]>"
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    AttrValue,
}

/// Decode element text content
///
/// Validates characters, rejects a literal "]]>", decodes entity and
/// character references, and normalizes line endings. Returns Borrowed
/// when no rewriting is needed (zero-copy).
pub fn decode_text(input: &str) -> Result<Cow<'_, str>, &'static str> {
    if input.contains("]]>") {
        return Err("']]>' not allowed in content");
    }
    decode(input, Mode::Text)
}

/// Decode an attribute value
///
/// Validates characters, decodes references, and normalizes literal
/// whitespace (tab, CR, LF) to single spaces. Characters produced by
/// references are exempt from normalization, as in XML attribute-value
/// normalization.
pub fn decode_attr_value(input: &str) -> Result<Cow<'_, str>, &'static str> {
    decode(input, Mode::AttrValue)
}

/// Prepare CDATA content: no entity decoding, but character validation
/// and line-ending normalization still apply
pub fn decode_cdata(input: &str) -> Result<Cow<'_, str>, &'static str> {
    validate_chars(input)?;
    if memchr(b'\r', input.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(cr) = memchr(b'\r', rest.as_bytes()) {
        out.push_str(&rest[..cr]);
        out.push('\n');
        rest = &rest[cr + 1..];
        if rest.as_bytes().first() == Some(&b'\n') {
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    Ok(Cow::Owned(out))
}

fn decode(input: &str, mode: Mode) -> Result<Cow<'_, str>, &'static str> {
    validate_chars(input)?;

    let bytes = input.as_bytes();
    let untouched = match mode {
        Mode::Text => memchr2(b'&', b'\r', bytes).is_none(),
        Mode::AttrValue => !bytes
            .iter()
            .any(|&b| matches!(b, b'&' | b'\r' | b'\n' | b'\t')),
    };
    if untouched {
        return Ok(Cow::Borrowed(input));
    }

    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let special = match mode {
            Mode::Text => memchr2(b'&', b'\r', &bytes[pos..]),
            Mode::AttrValue => bytes[pos..]
                .iter()
                .position(|&b| matches!(b, b'&' | b'\r' | b'\n' | b'\t')),
        };
        let Some(offset) = special else {
            out.push_str(&input[pos..]);
            break;
        };
        out.push_str(&input[pos..pos + offset]);
        pos += offset;
        match bytes[pos] {
            b'&' => {
                let (ch, consumed) = decode_reference(&input[pos..])?;
                out.push(ch);
                pos += consumed;
            }
            b'\r' => {
                // Line-ending normalization runs before attribute-value
                // normalization, so CRLF collapses either way
                out.push(match mode {
                    Mode::Text => '\n',
                    Mode::AttrValue => ' ',
                });
                pos += 1;
                if bytes.get(pos) == Some(&b'\n') {
                    pos += 1;
                }
            }
            b'\n' | b'\t' => {
                out.push(' ');
                pos += 1;
            }
            _ => unreachable!(),
        }
    }
    Ok(Cow::Owned(out))
}

/// Decode one reference starting at the '&'; returns the character and the
/// number of bytes consumed (including '&' and ';')
fn decode_reference(input: &str) -> Result<(char, usize), &'static str> {
    let bytes = input.as_bytes();
    debug_assert_eq!(bytes[0], b'&');

    if bytes.get(1) == Some(&b'#') {
        return decode_char_reference(input);
    }

    // Named entity: name chars up to ';'
    let mut end = 1;
    while end < bytes.len() && is_entity_name_byte(bytes[end]) {
        end += 1;
    }
    if end == 1 || bytes.get(end) != Some(&b';') {
        return Err("bare '&' is not allowed; use &amp;");
    }
    let ch = match &input[1..end] {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        _ => return Err("undefined entity"),
    };
    Ok((ch, end + 1))
}

/// Decode a numeric character reference: &#DD; or &#xHH;
fn decode_char_reference(input: &str) -> Result<(char, usize), &'static str> {
    let bytes = input.as_bytes();
    let (radix, digits_start) = if matches!(bytes.get(2), Some(b'x') | Some(b'X')) {
        (16, 3)
    } else {
        (10, 2)
    };

    let mut end = digits_start;
    while end < bytes.len() && bytes[end].is_ascii_hexdigit() {
        end += 1;
    }
    if end == digits_start || bytes.get(end) != Some(&b';') {
        return Err("invalid character reference");
    }

    let codepoint = u32::from_str_radix(&input[digits_start..end], radix)
        .map_err(|_| "invalid character reference")?;
    if !is_valid_xml_char_code(codepoint) {
        return Err("character reference outside the XML character range");
    }
    let ch = char::from_u32(codepoint).ok_or("invalid character reference")?;
    Ok((ch, end + 1))
}

#[inline]
fn is_entity_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Check that every character satisfies the XML 1.0 Char production
pub fn validate_chars(input: &str) -> Result<(), &'static str> {
    // ASCII control characters are the common offenders; everything in
    // 0x20..=0x7F is valid, so only non-ASCII needs the char-level check
    for (i, &b) in input.as_bytes().iter().enumerate() {
        if b < 0x20 && !matches!(b, 0x09 | 0x0A | 0x0D) {
            return Err("control character not allowed in XML content");
        }
        if b >= 0x80 {
            return input[i..]
                .chars()
                .all(is_valid_xml_char)
                .then_some(())
                .ok_or("character outside the XML character range");
        }
    }
    Ok(())
}

/// XML 1.0 Char production:
/// #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(c: char) -> bool {
    is_valid_xml_char_code(c as u32)
}

#[inline]
fn is_valid_xml_char_code(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

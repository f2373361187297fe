//! Common parsing utilities for the XLSX parts

use crate::error::{XlsxError, XlsxResult};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::str::FromStr;

/// Read text content from an XML node, up to its closing tag
pub fn read_text_node<R: std::io::BufRead>(reader: &mut Reader<R>) -> XlsxResult<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(e.unescape()?.as_ref()),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(e.as_ref())),
            Event::End(_) => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

/// Skip everything up to and including the end tag of the element just opened
pub fn skip_element<R: std::io::BufRead>(reader: &mut Reader<R>) -> XlsxResult<()> {
    let mut buf = Vec::new();
    let mut depth = 1usize;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// All attributes of an element as (key, unescaped value) pairs
pub fn attributes(e: &BytesStart<'_>) -> XlsxResult<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        attrs.push((key, attr.unescape_value()?.into_owned()));
    }
    Ok(attrs)
}

/// Value of a single attribute, if present
pub fn attribute(e: &BytesStart<'_>, name: &[u8]) -> XlsxResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Parse an attribute value, reporting the attribute on failure
pub fn parse_value<T: FromStr>(name: &str, value: &str) -> XlsxResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| XlsxError::InvalidFormat(format!("invalid {} '{}'", name, value)))
}

/// XML boolean ("1" / "true")
pub fn is_true(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

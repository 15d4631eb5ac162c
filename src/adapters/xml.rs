//! XML adapter built on quick-xml.
//!
//! Layout: an XML declaration, a `root` element, and one `ID_vehicle_<id>`
//! child per vehicle. Every document key becomes an element. Nested
//! documents become nested elements, sequences become repeated siblings and
//! scalars become escaped text.
//!
//! Decoding reverses this. An element with children becomes a document,
//! repeated sibling tags become a sequence and a leaf becomes a string. The
//! codec reads numeric fields from those strings.

use crate::domain::model::Document;
use crate::domain::ports::{Format, FormatAdapter};
use crate::utils::error::{RegistryError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::Value;
use std::collections::HashSet;

pub const ROOT_ELEMENT: &str = "root";
pub const VEHICLE_KEY_PREFIX: &str = "ID_vehicle_";

#[derive(Debug, Clone, Default)]
pub struct XmlAdapter;

impl XmlAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FormatAdapter for XmlAdapter {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn entry_key(&self, id: u64) -> String {
        format!("{}{}", VEHICLE_KEY_PREFIX, id)
    }

    fn parse_entry_key(&self, key: &str) -> Option<u64> {
        key.strip_prefix(VEHICLE_KEY_PREFIX)?.parse().ok()
    }

    fn encode(&self, entries: &[(String, Document)]) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(RegistryError::xml)?;

        if entries.is_empty() {
            writer
                .write_event(Event::Empty(BytesStart::new(ROOT_ELEMENT)))
                .map_err(RegistryError::xml)?;
        } else {
            writer
                .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
                .map_err(RegistryError::xml)?;
            for (key, doc) in entries {
                write_document(&mut writer, key, doc)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
                .map_err(RegistryError::xml)?;
        }

        let mut data = writer.into_inner();
        data.push(b'\n');
        Ok(data)
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<(String, Document)>> {
        let text = std::str::from_utf8(data)
            .map_err(|e| RegistryError::xml(format!("invalid UTF-8: {}", e)))?;
        let (name, value) = parse_tree(text)?;

        if name != ROOT_ELEMENT {
            return Err(RegistryError::xml(format!(
                "expected <{}> as the root element, found <{}>",
                ROOT_ELEMENT, name
            )));
        }

        let entries = match value {
            Value::Object(entries) => entries,
            Value::String(s) if s.trim().is_empty() => return Ok(Vec::new()),
            _ => {
                return Err(RegistryError::xml(format!(
                    "<{}> must contain vehicle elements",
                    ROOT_ELEMENT
                )))
            }
        };

        let mut records = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match value {
                // 重複的車輛標籤全部保留，交給匯入時檢查重複 ID
                Value::Array(items) => {
                    for item in items {
                        records.push((key.clone(), entry_document(&key, item)?));
                    }
                }
                other => {
                    let doc = entry_document(&key, other)?;
                    records.push((key, doc));
                }
            }
        }
        Ok(records)
    }
}

fn entry_document(key: &str, value: Value) -> Result<Document> {
    match value {
        Value::Object(doc) => Ok(doc),
        Value::String(s) if s.trim().is_empty() => Ok(Document::new()),
        other => Err(RegistryError::malformed(
            key,
            format!("expected nested elements, got text {}", other),
        )),
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn write_document(writer: &mut Writer<Vec<u8>>, name: &str, doc: &Document) -> Result<()> {
    if doc.is_empty() {
        return write_empty(writer, name);
    }

    start_element(writer, name)?;
    for (key, value) in doc {
        write_value(writer, key, value)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(RegistryError::xml)?;
    Ok(())
}

fn write_value(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Object(doc) => write_document(writer, name, doc),
        Value::Array(items) => {
            for item in items {
                write_value(writer, name, item)?;
            }
            Ok(())
        }
        Value::Null => write_empty(writer, name),
        Value::String(s) if s.is_empty() => write_empty(writer, name),
        Value::String(s) => write_text(writer, name, s),
        Value::Number(n) => write_text(writer, name, &n.to_string()),
        Value::Bool(b) => write_text(writer, name, if *b { "true" } else { "false" }),
    }
}

fn start_element(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    if !is_valid_name(name) {
        return Err(RegistryError::xml(format!(
            "'{}' is not a valid element name",
            name
        )));
    }
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(RegistryError::xml)?;
    Ok(())
}

fn write_empty(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    if !is_valid_name(name) {
        return Err(RegistryError::xml(format!(
            "'{}' is not a valid element name",
            name
        )));
    }
    writer
        .write_event(Event::Empty(BytesStart::new(name)))
        .map_err(RegistryError::xml)?;
    Ok(())
}

fn write_text(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    start_element(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(RegistryError::xml)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(RegistryError::xml)?;
    Ok(())
}

/// One open element while building the tree.
struct Frame {
    name: String,
    text: String,
    children: Document,
    repeated: HashSet<String>,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Document::new(),
            repeated: HashSet::new(),
        }
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) if self.repeated.contains(&name) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
                self.repeated.insert(name);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn finish(self) -> Result<(String, Value)> {
        if self.children.is_empty() {
            return Ok((self.name, Value::String(self.text)));
        }
        if !self.text.trim().is_empty() {
            return Err(RegistryError::xml(format!(
                "<{}> mixes text and child elements",
                self.name
            )));
        }
        Ok((self.name, Value::Object(self.children)))
    }
}

fn resolve_reference(name: &str) -> Result<String> {
    let resolved = if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        parsed.and_then(char::from_u32).map(String::from)
    } else {
        match name {
            "lt" => Some("<"),
            "gt" => Some(">"),
            "amp" => Some("&"),
            "apos" => Some("'"),
            "quot" => Some("\""),
            _ => None,
        }
        .map(String::from)
    };

    resolved.ok_or_else(|| RegistryError::xml(format!("unknown entity reference &{};", name)))
}

fn parse_tree(text: &str) -> Result<(String, Value)> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event().map_err(RegistryError::xml)? {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(RegistryError::xml("content after the root element"));
                }
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| RegistryError::xml("unexpected closing tag"))?;
                let (name, value) = frame.finish()?;
                match stack.last_mut() {
                    Some(parent) => parent.push_child(name, value),
                    None => root = Some((name, value)),
                }
            }
            Event::Text(content) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&content));
                }
            }
            Event::CData(content) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&content));
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(frame) = stack.last_mut() {
                    let name = String::from_utf8_lossy(&reference).into_owned();
                    frame.text.push_str(&resolve_reference(&name)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(RegistryError::xml("unexpected end of document"));
    }
    root.ok_or_else(|| RegistryError::xml("document has no root element"))
}

// Adapters layer: wire formats for exported registries.

pub mod json;
pub mod xml;

use crate::domain::ports::{Format, FormatAdapter};

pub fn adapter_for(format: Format, key_prefix: &str) -> Box<dyn FormatAdapter> {
    match format {
        Format::Json => Box::new(json::JsonAdapter::new(key_prefix)),
        Format::Xml => Box::new(xml::XmlAdapter::new()),
    }
}

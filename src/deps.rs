//! Encoding of dependency links for the runtime invocation
//!
//! The runtime CLI takes the dependency map as a single quoted-literal
//! argument, so the encoding happens in three separately testable steps:
//! splitting the raw `key:value` entries, serializing them as a JSON object
//! with real string escaping, and wrapping the object text in literal
//! quotes.

use crate::errors::RunError;

/// Split raw `key:value` entries into pairs
///
/// Each entry is split on its first colon, so values may themselves contain
/// colons. An entry with no colon at all is an error.
pub fn parse_pairs(entries: &[String]) -> Result<Vec<(&str, &str)>, RunError> {
    entries
        .iter()
        .map(|entry| {
            let mut parts = entry.splitn(2, ':');
            let key = parts.next().expect("split always yields one part");
            match parts.next() {
                Some(value) => Ok((key, value)),
                None => Err(RunError::InvalidDependency(entry.clone())),
            }
        })
        .collect()
}

/// Serialize pairs as JSON object text, positionally and in input order
///
/// Keys are not deduplicated; every entry is emitted where it appeared.
pub fn serialize_pairs(pairs: &[(&str, &str)]) -> String {
    let mut buffer = String::from("{");
    for (index, (key, value)) in pairs.iter().enumerate() {
        if index > 0 {
            buffer.push(',');
        }
        buffer.push_str(&json_string(key));
        buffer.push(':');
        buffer.push_str(&json_string(value));
    }
    buffer.push('}');
    buffer
}

/// Wrap serialized text in the outer quotes the runtime CLI expects
pub fn quote_literal(text: &str) -> String {
    format!("\"{}\"", text)
}

/// Encode raw `key:value` entries as the runtime's quoted map literal
pub fn encode_dependency_map(entries: &[String]) -> Result<String, RunError> {
    Ok(quote_literal(&serialize_pairs(&parse_pairs(entries)?)))
}

fn json_string(s: &str) -> String {
    serde_json::to_string(s).expect("string serialization is infallible")
}

use serde_json::Value;
use std::fmt::{Display, Formatter};

/// The top level arrays whose entries may point at external files through `uri`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriSection {
    Images,
    Buffers,
}

impl UriSection {
    pub const ALL: [UriSection; 2] = [UriSection::Images, UriSection::Buffers];

    pub fn key(&self) -> &'static str {
        match self {
            UriSection::Images => "images",
            UriSection::Buffers => "buffers",
        }
    }
}

impl Display for UriSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Location of a single `uri` field, e.g. `buffers[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriSlot {
    pub section: UriSection,
    pub index: usize,
    /// The declared `byteLength` of a buffer, images don't carry one.
    pub byte_length: Option<u64>,
}

impl Display for UriSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.section, self.index)
    }
}

/// A parsed JSON glTF. Only the `uri` fields of images and buffers are interpreted, everything else is kept
/// as an opaque [`Value`] so the round trip doesn't lose anything we don't understand.
#[derive(Debug, Clone)]
pub struct GltfDocument {
    pub(crate) root: Value,
}

impl GltfDocument {
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Calls `visit` with every string `uri` of `images[]` and `buffers[]`, in that order, allowing to replace it.
    pub fn visit_uris_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&UriSlot, &mut String),
    {
        for section in UriSection::ALL {
            let Some(Value::Array(entries)) = self.root.get_mut(section.key()) else {
                continue;
            };

            for (index, entry) in entries.iter_mut().enumerate() {
                let byte_length = entry.get("byteLength").and_then(Value::as_u64);
                if let Some(Value::String(uri)) = entry.get_mut("uri") {
                    let slot = UriSlot {
                        section,
                        index,
                        byte_length,
                    };
                    visit(&slot, uri);
                }
            }
        }
    }

    pub fn uris(&self) -> Vec<(UriSlot, String)> {
        let mut uris = Vec::new();
        for section in UriSection::ALL {
            let Some(Value::Array(entries)) = self.root.get(section.key()) else {
                continue;
            };

            for (index, entry) in entries.iter().enumerate() {
                if let Some(uri) = entry.get("uri").and_then(Value::as_str) {
                    let slot = UriSlot {
                        section,
                        index,
                        byte_length: entry.get("byteLength").and_then(Value::as_u64),
                    };
                    uris.push((slot, uri.to_string()));
                }
            }
        }
        uris
    }
}

/// Embedded payloads never resolve against the archive.
pub fn is_data_uri(uri: &str) -> bool {
    uri.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

use crate::DocumentError;
use crate::gltf::types::GltfDocument;
use serde_json::Value;

pub struct GltfReader {}

impl GltfReader {
    pub fn parse_document(bytes: &[u8]) -> Result<GltfDocument, DocumentError> {
        let text = std::str::from_utf8(bytes)?;
        // Some exporters write a BOM, which serde_json refuses.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let root: Value = serde_json::from_str(text)?;
        if !root.is_object() {
            return Err(DocumentError::NotAnObject);
        }

        Ok(GltfDocument { root })
    }

    pub fn write_document(document: &GltfDocument) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(&document.root)?)
    }
}

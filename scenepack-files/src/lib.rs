use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("The archive is {size} bytes large, which exceeds the limit of {limit} bytes")]
    Oversize { size: u64, limit: u64 },

    #[error("The archive container could not be decoded: {0}")]
    ArchiveDecode(#[from] zip::result::ZipError),

    /// Only ever surfaced per member, the extraction itself continues without it.
    #[error("The archive member {path} could not be decoded, because: {reason}")]
    MemberDecode { path: String, reason: String },

    #[error("The archive does not contain a glTF scene (.gltf or .glb)")]
    NoSceneDocument,
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("The scene document is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("The scene document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("The scene document's top level value is not a JSON object")]
    NotAnObject,
}

pub mod archive;
pub mod gltf;

use crate::ExtractError;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// 256 MiB, well above what browsers and viewers handle for a single glTF bundle.
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 256 * 1024 * 1024;

const IMAGE_EXTENSIONS: [&str; 9] = ["png", "jpg", "jpeg", "gif", "bmp", "webp", "ktx2", "dds", "tga"];
const TEXT_EXTENSIONS: [&str; 4] = ["gltf", "json", "txt", "mtl"];

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub max_archive_size: u64,
    /// Members announcing a larger uncompressed size are dropped before inflating. `None` means no per-member limit.
    pub max_member_size: Option<u64>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
            max_member_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    /// JSON glTF (`.gltf`), the only kind with external references that need rewriting.
    SceneDocument,
    /// Self-contained binary glTF (`.glb`).
    SceneBinary,
    /// Companion vertex/index data (`.bin`).
    BinaryBuffer,
    Image,
    Opaque,
}

impl BlobKind {
    pub fn from_path(path: &str) -> Self {
        let extension = extension_of(path);
        match extension.as_str() {
            "gltf" => BlobKind::SceneDocument,
            "glb" => BlobKind::SceneBinary,
            "bin" => BlobKind::BinaryBuffer,
            ext if IMAGE_EXTENSIONS.contains(&ext) => BlobKind::Image,
            _ => BlobKind::Opaque,
        }
    }

    /// Both glTF flavours count as the scene an archive has to contain.
    pub fn is_scene(&self) -> bool {
        matches!(self, BlobKind::SceneDocument | BlobKind::SceneBinary)
    }
}

impl Display for BlobKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BlobKind::SceneDocument => "scene-document",
            BlobKind::SceneBinary => "scene-binary",
            BlobKind::BinaryBuffer => "binary-buffer",
            BlobKind::Image => "image",
            BlobKind::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Position of a blob inside its [`BlobSet`], which is the archive enumeration order minus dropped members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobId(pub usize);

impl Display for BlobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct Blob {
    pub id: BlobId,
    /// Final path segment
    pub name: String,
    /// Full archive relative path, always using forward slashes
    pub path: String,
    pub kind: BlobKind,
    pub bytes: Arc<[u8]>,
}

impl Blob {
    pub fn new(id: BlobId, path: &str, bytes: impl Into<Arc<[u8]>>) -> Self {
        let path = normalize_member_path(path);
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            id,
            kind: BlobKind::from_path(&path),
            name,
            path,
            bytes: bytes.into(),
        }
    }

    /// Whether the payload is meant to be consumed as text rather than bytes.
    pub fn is_textual(&self) -> bool {
        TEXT_EXTENSIONS.contains(&extension_of(&self.path).as_str())
    }

    /// Directory of this blob including the trailing slash, or an empty string at the archive root.
    pub fn base_dir(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..=idx],
            None => "",
        }
    }
}

/// The immutable result of an extraction. Construction guarantees at least one scene member.
#[derive(Debug)]
pub struct BlobSet {
    blobs: Vec<Arc<Blob>>,
    scene_count: usize,
    primary_scene: usize,
}

impl BlobSet {
    /// Takes members in archive order and assigns their [`BlobId`]s.
    pub fn new(members: Vec<(String, Arc<[u8]>)>) -> Result<Self, ExtractError> {
        let blobs: Vec<Arc<Blob>> = members
            .into_iter()
            .enumerate()
            .map(|(idx, (path, bytes))| Arc::new(Blob::new(BlobId(idx), &path, bytes)))
            .collect();

        let scene_count = blobs.iter().filter(|blob| blob.kind.is_scene()).count();

        // JSON documents take precedence, a .glb next to a .gltf is usually just an alternative export.
        let primary_scene = blobs
            .iter()
            .position(|blob| blob.kind == BlobKind::SceneDocument)
            .or_else(|| blobs.iter().position(|blob| blob.kind == BlobKind::SceneBinary))
            .ok_or(ExtractError::NoSceneDocument)?;

        Ok(Self {
            blobs,
            scene_count,
            primary_scene,
        })
    }

    pub fn get(&self, id: BlobId) -> Option<&Arc<Blob>> {
        self.blobs.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Blob>> {
        self.blobs.iter()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn scene_count(&self) -> usize {
        self.scene_count
    }

    /// The scene the renderer ultimately loads: the first `.gltf` in archive order, otherwise the first `.glb`.
    pub fn scene_document(&self) -> &Arc<Blob> {
        &self.blobs[self.primary_scene]
    }
}

/// Backslashes become forward slashes, leading `./` and `/` are dropped.
pub fn normalize_member_path(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let mut trimmed = slashed.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_string()
}

fn extension_of(path: &str) -> String {
    let name = path.rsplit(['/', '\\']).next().unwrap_or_default();
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

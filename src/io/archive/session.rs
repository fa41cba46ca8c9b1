use crate::io::archive::handles::HandleRegistry;
use crate::io::archive::index::PathIndex;
use crate::io::archive::resolver::ReferenceResolver;
use log::info;
use scenepack_files::ExtractError;
use scenepack_files::archive::reader::ArchiveReader;
use scenepack_files::archive::types::{Blob, BlobSet, ExtractorSettings};
use std::sync::Arc;

/// Everything that lives as long as one loaded archive: the blobs, their index and the content handles issued
/// for them. Dropping the session releases the handles.
pub struct ArchiveSession {
    blobs: BlobSet,
    index: PathIndex,
    handles: HandleRegistry,
}

impl ArchiveSession {
    pub async fn open(bytes: impl Into<Arc<[u8]>>, settings: &ExtractorSettings) -> Result<Self, ExtractError> {
        let blobs = ArchiveReader::extract(bytes, settings).await?;
        Ok(Self::from_blobs(blobs))
    }

    pub fn from_blobs(blobs: BlobSet) -> Self {
        let index = PathIndex::build(&blobs);
        Self {
            blobs,
            index,
            handles: HandleRegistry::new(),
        }
    }

    pub fn resolver(&self) -> ReferenceResolver<'_> {
        ReferenceResolver::new(&self.blobs, &self.index)
    }

    pub fn blobs(&self) -> &BlobSet {
        &self.blobs
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn scene_document(&self) -> &Arc<Blob> {
        self.blobs.scene_document()
    }

    /// References inside the scene document are relative to this directory.
    pub fn scene_base_dir(&self) -> &str {
        self.scene_document().base_dir()
    }

    /// Ends the session's content handles. Calling it more than once is harmless.
    pub fn release(&self) -> usize {
        let released = self.handles.release();
        if released > 0 {
            info!("Archive session released {} content handles", released);
        }
        released
    }
}

impl Drop for ArchiveSession {
    fn drop(&mut self) {
        self.release();
    }
}

use dashmap::DashMap;
use log::{debug, trace};
use scenepack_files::archive::types::{Blob, BlobId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Every handle this crate issues starts with this scheme.
pub const HANDLE_SCHEME: &str = "scenepack://";

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque stand-in for a blob that a renderer can dereference without knowing archive paths.
#[derive(Debug, PartialEq, Eq)]
pub struct ContentHandle {
    uri: String,
    blob: BlobId,
}

impl ContentHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn blob(&self) -> BlobId {
        self.blob
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleLookup {
    /// Not one of our uris at all
    NotAHandle,
    Live(BlobId),
    /// Ours (or another session's) but no longer backed by a blob
    Released,
}

/// One handle per blob, created lazily and reused, so rewriting the same document twice produces the same uris.
/// Owned by the archive session and released as a whole.
pub struct HandleRegistry {
    session_id: u64,
    by_blob: DashMap<BlobId, Arc<ContentHandle>>,
    by_uri: DashMap<String, BlobId>,
    released: AtomicBool,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            session_id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            by_blob: DashMap::new(),
            by_uri: DashMap::new(),
            released: AtomicBool::new(false),
        }
    }

    fn prefix(&self) -> String {
        format!("{}{}/", HANDLE_SCHEME, self.session_id)
    }

    /// `None` once the registry has been released.
    pub fn handle_for(&self, blob: &Blob) -> Option<Arc<ContentHandle>> {
        if self.released.load(Ordering::Acquire) {
            return None;
        }

        let handle = self
            .by_blob
            .entry(blob.id)
            .or_insert_with(|| {
                let uri = format!(
                    "{}{}/{}",
                    self.prefix(),
                    blob.id,
                    urlencoding::encode(&blob.name)
                );
                trace!("Issued {} for {}", uri, blob.path);
                self.by_uri.insert(uri.clone(), blob.id);
                Arc::new(ContentHandle { uri, blob: blob.id })
            })
            .clone();

        // a release() may have cleared the maps between the check above and the insert
        if self.released.load(Ordering::Acquire) {
            self.by_blob.remove(&blob.id);
            self.by_uri.remove(&handle.uri);
            return None;
        }
        Some(handle)
    }

    pub fn is_handle(uri: &str) -> bool {
        uri.starts_with(HANDLE_SCHEME)
    }

    pub fn lookup(&self, uri: &str) -> HandleLookup {
        if !Self::is_handle(uri) {
            return HandleLookup::NotAHandle;
        }

        match self.by_uri.get(uri) {
            Some(id) if !self.released.load(Ordering::Acquire) => HandleLookup::Live(*id),
            _ => HandleLookup::Released,
        }
    }

    pub fn live_count(&self) -> usize {
        self.by_blob.len()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Revokes every handle. Idempotent, returns how many handles were live.
    pub fn release(&self) -> usize {
        if self.released.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let count = self.by_blob.len();
        self.by_blob.clear();
        self.by_uri.clear();
        debug!("Released {} content handles of session {}", count, self.session_id);
        count
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

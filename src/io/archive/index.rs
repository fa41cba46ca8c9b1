use log::trace;
use scenepack_files::archive::types::{BlobId, BlobKind, BlobSet};
use std::collections::HashMap;

/// Normalized lookup keys over a [`BlobSet`]. Several keys point to the same blob, and the first blob to claim
/// a key keeps it. Built once and never mutated afterwards.
#[derive(Debug, Default)]
pub struct PathIndex {
    keys: HashMap<String, BlobId>,
    buffer_pool: Vec<BlobId>,
}

impl PathIndex {
    pub fn build(blobs: &BlobSet) -> Self {
        let mut index = PathIndex::default();

        for blob in blobs.iter() {
            let name = blob.name.to_lowercase();
            let path = blob.path.to_lowercase();

            // The name doubles as the bare basename key.
            index.insert(name, blob.id);
            index.insert(path.clone(), blob.id);
            // Tolerates archives that wrap everything into one top level folder
            if let Some((_, without_root)) = path.split_once('/') {
                if !without_root.is_empty() {
                    index.insert(without_root.to_string(), blob.id);
                }
            }

            if blob.kind == BlobKind::BinaryBuffer {
                index.buffer_pool.push(blob.id);
            }
        }

        trace!(
            "Indexed {} blobs under {} keys, {} binary buffers",
            blobs.len(),
            index.keys.len(),
            index.buffer_pool.len()
        );
        index
    }

    fn insert(&mut self, key: String, id: BlobId) {
        self.keys.entry(key).or_insert(id);
    }

    pub fn get(&self, key: &str) -> Option<BlobId> {
        self.keys.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = (&str, BlobId)> {
        self.keys.iter().map(|(key, id)| (key.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All binary buffers, in archive order.
    pub fn buffer_pool(&self) -> &[BlobId] {
        &self.buffer_pool
    }
}

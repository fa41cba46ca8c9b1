use crate::ExtractError;
use crate::archive::types::{BlobSet, ExtractorSettings};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use std::io::{Cursor, Read};
use std::sync::Arc;
use zip::ZipArchive;

type SharedArchive = ZipArchive<Cursor<Arc<[u8]>>>;

pub struct ArchiveReader {}

impl ArchiveReader {
    /// Decodes every file member of a ZIP archive into a [`BlobSet`].
    ///
    /// Members are inflated concurrently on tokio's blocking pool, each task working on its own clone of the
    /// archive (the central directory is shared). A member that fails to decode is logged and dropped; only
    /// a corrupt container, an oversized input or a missing scene fail the whole extraction.
    pub async fn extract(bytes: impl Into<Arc<[u8]>>, settings: &ExtractorSettings) -> Result<BlobSet, ExtractError> {
        let bytes: Arc<[u8]> = bytes.into();
        let size = bytes.len() as u64;
        if size > settings.max_archive_size {
            return Err(ExtractError::Oversize {
                size,
                limit: settings.max_archive_size,
            });
        }

        let archive = ZipArchive::new(Cursor::new(bytes))?;
        trace!("Archive contains {} entries", archive.len());

        let tasks = (0..archive.len())
            .map(|index| {
                let mut archive = archive.clone();
                let max_member_size = settings.max_member_size;
                tokio::task::spawn_blocking(move || Self::read_member(&mut archive, index, max_member_size))
            })
            .collect_vec();

        // Awaiting in spawn order keeps the archive enumeration order, the tasks themselves run concurrently.
        let mut members = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.into_iter().enumerate() {
            match task.await {
                Ok(Ok(Some(member))) => members.push(member),
                Ok(Ok(None)) => {}
                Ok(Err(err)) => warn!("Dropping archive member: {}", err),
                Err(join_err) => warn!("Dropping archive member #{}, the decoding task failed: {}", index, join_err),
            }
        }

        let blob_set = BlobSet::new(members)?;
        info!(
            "Extracted {} members ({} scenes), primary scene is {}",
            blob_set.len(),
            blob_set.scene_count(),
            blob_set.scene_document().path
        );
        Ok(blob_set)
    }

    /// Returns `None` for directory entries.
    fn read_member(
        archive: &mut SharedArchive,
        index: usize,
        max_member_size: Option<u64>,
    ) -> Result<Option<(String, Arc<[u8]>)>, ExtractError> {
        let mut file = archive
            .by_index(index)
            .map_err(|err| ExtractError::MemberDecode {
                path: format!("#{}", index),
                reason: err.to_string(),
            })?;

        if file.is_dir() {
            trace!("Skipping directory {}", file.name());
            return Ok(None);
        }

        let path = file.name().to_string();
        if let Some(limit) = max_member_size {
            if file.size() > limit {
                return Err(ExtractError::MemberDecode {
                    reason: format!("{} bytes exceed the member limit of {} bytes", file.size(), limit),
                    path,
                });
            }
        }

        // size() is only a hint from the central directory, so we don't trust it for more than the capacity.
        let mut buf = Vec::with_capacity(file.size().min(64 * 1024 * 1024) as usize);
        file.read_to_end(&mut buf)
            .map_err(|err| ExtractError::MemberDecode {
                path: path.clone(),
                reason: err.to_string(),
            })?;

        debug!("Decoded {} ({} bytes)", path, buf.len());
        Ok(Some((path, buf.into())))
    }
}

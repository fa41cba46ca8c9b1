use crate::io::archive::handles::HandleLookup;
use crate::io::archive::resolver::ResolveHint;
use crate::io::archive::session::ArchiveSession;
use crate::io::common::loader::{LoadedResource, ResourceLoadError, ResourceLoader};
use crate::io::network::{NetworkFetcher, OfflineFetcher, UreqFetcher, is_network_address};
use crate::rendering::loader::gltf_rewriter::GltfRewriter;
use log::{error, trace, warn};
use scenepack_files::archive::types::{Blob, BlobKind};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub allow_network: bool,
    pub network_timeout: Duration,
    pub max_response_size: u64,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            allow_network: true,
            network_timeout: Duration::from_secs(30),
            max_response_size: 256 * 1024 * 1024,
        }
    }
}

/// Serves every resource a rendering pipeline asks for out of one archive session. The scene document is always
/// handed out rewritten, so whatever the renderer reads next is already a content handle.
pub struct ArchiveLoader {
    session: Arc<ArchiveSession>,
    network: Arc<dyn NetworkFetcher>,
}

impl ArchiveLoader {
    pub fn new(session: Arc<ArchiveSession>, settings: &LoaderSettings) -> Self {
        let network: Arc<dyn NetworkFetcher> = if settings.allow_network {
            Arc::new(UreqFetcher::new(
                settings.network_timeout,
                settings.max_response_size,
            ))
        } else {
            Arc::new(OfflineFetcher)
        };
        Self::with_fetcher(session, network)
    }

    pub fn with_fetcher(session: Arc<ArchiveSession>, network: Arc<dyn NetworkFetcher>) -> Self {
        Self { session, network }
    }

    pub fn session(&self) -> &Arc<ArchiveSession> {
        &self.session
    }

    /// The reference a pipeline starts with.
    pub fn entry_reference(&self) -> &str {
        &self.session.scene_document().path
    }

    /// Handles are self-resolving, so this is a plain byte fetch. Only a scene document still goes through the
    /// rewriter, its references have to become handles no matter how it was reached.
    fn fetch_handle(&self, reference: &str, lookup: HandleLookup) -> Result<LoadedResource, ResourceLoadError> {
        match lookup {
            HandleLookup::Live(id) => {
                let blob = self
                    .session
                    .blobs()
                    .get(id)
                    .ok_or_else(|| ResourceLoadError::NotFound {
                        reference: reference.to_string(),
                    })?;
                if blob.kind == BlobKind::SceneDocument {
                    return self.read_blob(reference, blob);
                }
                Ok(LoadedResource::Bytes(blob.bytes.clone()))
            }
            HandleLookup::Released | HandleLookup::NotAHandle => Err(ResourceLoadError::Released {
                reference: reference.to_string(),
            }),
        }
    }

    fn read_blob(&self, reference: &str, blob: &Blob) -> Result<LoadedResource, ResourceLoadError> {
        if blob.kind == BlobKind::SceneDocument {
            let rewritten = GltfRewriter::new(&self.session)
                .rewrite(blob)
                .map_err(|source| ResourceLoadError::Document {
                    reference: reference.to_string(),
                    source,
                })?;
            return Ok(LoadedResource::Text(rewritten.text));
        }

        if blob.is_textual() {
            if let Ok(text) = std::str::from_utf8(&blob.bytes) {
                return Ok(LoadedResource::Text(text.to_string()));
            }
            warn!("{} looks textual but isn't UTF-8, handing out bytes", blob.path);
        }

        Ok(LoadedResource::Bytes(blob.bytes.clone()))
    }

    fn fetch_remote(&self, reference: &str) -> Result<LoadedResource, ResourceLoadError> {
        if !is_network_address(reference) {
            return Err(ResourceLoadError::NotFound {
                reference: reference.to_string(),
            });
        }

        trace!("{} is not part of the archive, trying the network", reference);
        self.network
            .fetch(reference)
            .map(|bytes| LoadedResource::Bytes(bytes.into()))
            .map_err(|source| ResourceLoadError::Network {
                reference: reference.to_string(),
                source,
            })
    }
}

impl ResourceLoader for ArchiveLoader {
    fn load(&self, reference: &str) -> Result<LoadedResource, ResourceLoadError> {
        let result = match self.session.handles().lookup(reference) {
            HandleLookup::NotAHandle => {
                let resolution =
                    self.session
                        .resolver()
                        .resolve_detailed(reference, self.session.scene_base_dir(), ResolveHint::default());
                match resolution {
                    Some(resolution) => self.read_blob(reference, &resolution.blob),
                    None => self.fetch_remote(reference),
                }
            }
            lookup => self.fetch_handle(reference, lookup),
        };

        if let Err(err) = &result {
            error!("Loading failed: {}", err);
        }
        result
    }
}

use crate::io::common::loader::{LoadedResource, ResourceLoadError, ResourceLoader};
use crate::rendering::hook::LoaderHook;
use log::{error, info};
use scenepack_files::DocumentError;
use scenepack_files::gltf::reader::GltfReader;
use scenepack_files::gltf::types::{UriSection, is_data_uri};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneLoadError {
    #[error(transparent)]
    Load(#[from] ResourceLoadError),

    #[error("The scene document {reference} is invalid: {source}")]
    Document {
        reference: String,
        #[source]
        source: DocumentError,
    },
}

#[derive(Debug)]
pub struct LoadedAsset {
    pub section: UriSection,
    pub index: usize,
    pub uri: String,
    pub data: LoadedResource,
}

#[derive(Debug)]
pub struct LoadedScene {
    pub document: LoadedResource,
    pub assets: Vec<LoadedAsset>,
    /// Resources that failed individually. The scene is still usable, just without them.
    pub missing: Vec<ResourceLoadError>,
}

impl LoadedScene {
    pub fn buffers(&self) -> impl Iterator<Item = &LoadedAsset> {
        self.assets
            .iter()
            .filter(|asset| asset.section == UriSection::Buffers)
    }

    pub fn images(&self) -> impl Iterator<Item = &LoadedAsset> {
        self.assets
            .iter()
            .filter(|asset| asset.section == UriSection::Images)
    }
}

/// The part of a rendering pipeline that fetches a glTF and everything it references. It never touches the
/// archive itself, everything goes through the loader it was constructed with.
pub struct SceneLoader {
    loader: Arc<dyn ResourceLoader>,
}

impl SceneLoader {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self { loader }
    }

    /// For hosts that can only be reached through the process wide hook.
    pub fn from_hook() -> Option<Self> {
        LoaderHook::current().map(Self::new)
    }

    pub fn load(&self, reference: &str) -> Result<LoadedScene, SceneLoadError> {
        let document = self.loader.load(reference)?;

        // .glb files are self-contained, there is nothing to follow.
        let text = match document {
            LoadedResource::Text(text) => text,
            binary => {
                info!("Loaded binary scene {} ({} bytes)", reference, binary.len());
                return Ok(LoadedScene {
                    document: binary,
                    assets: Vec::new(),
                    missing: Vec::new(),
                });
            }
        };

        let gltf = GltfReader::parse_document(text.as_bytes()).map_err(|source| SceneLoadError::Document {
            reference: reference.to_string(),
            source,
        })?;

        let mut assets = Vec::new();
        let mut missing = Vec::new();
        for (slot, uri) in gltf.uris() {
            if is_data_uri(&uri) {
                continue;
            }

            match self.loader.load(&uri) {
                Ok(data) => assets.push(LoadedAsset {
                    section: slot.section,
                    index: slot.index,
                    uri,
                    data,
                }),
                Err(err) => {
                    error!("{} of {} is missing: {}", slot, reference, err);
                    missing.push(err);
                }
            }
        }

        info!(
            "Loaded scene {} with {} resources, {} missing",
            reference,
            assets.len(),
            missing.len()
        );
        Ok(LoadedScene {
            document: LoadedResource::Text(text),
            assets,
            missing,
        })
    }
}

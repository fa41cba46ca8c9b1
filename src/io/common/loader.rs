use crate::io::network::NetworkError;
use scenepack_files::DocumentError;
use std::sync::Arc;
use thiserror::Error;

/// What a loader hands back to the rendering pipeline.
#[derive(Debug, Clone)]
pub enum LoadedResource {
    Bytes(Arc<[u8]>),
    Text(String),
}

impl LoadedResource {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            LoadedResource::Bytes(bytes) => bytes,
            LoadedResource::Text(text) => text.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every variant carries the reference exactly as the caller passed it.
#[derive(Error, Debug)]
pub enum ResourceLoadError {
    #[error("{reference} could not be resolved inside the archive")]
    NotFound { reference: String },

    #[error("{reference} could not be resolved inside the archive, and the network fallback failed: {source}")]
    Network {
        reference: String,
        #[source]
        source: NetworkError,
    },

    #[error("{reference} is a content handle that has already been released")]
    Released { reference: String },

    #[error("The scene document {reference} could not be rewritten: {source}")]
    Document {
        reference: String,
        #[source]
        source: DocumentError,
    },

    #[error("No loader is installed to load {reference}")]
    NoLoader { reference: String },
}

impl ResourceLoadError {
    pub fn reference(&self) -> &str {
        match self {
            ResourceLoadError::NotFound { reference }
            | ResourceLoadError::Network { reference, .. }
            | ResourceLoadError::Released { reference }
            | ResourceLoadError::Document { reference, .. }
            | ResourceLoadError::NoLoader { reference } => reference,
        }
    }
}

/// The single point through which a rendering pipeline retrieves every resource it needs.
/// Failing one request must never affect sibling requests.
pub trait ResourceLoader: Send + Sync {
    fn load(&self, reference: &str) -> Result<LoadedResource, ResourceLoadError>;
}

use log::{debug, trace};
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Not a network address")]
    NotAnAddress,

    #[error("Network access is disabled")]
    Disabled,

    #[error(transparent)]
    Request(#[from] Box<ureq::Error>),

    #[error("Reading the response failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("The response exceeds the limit of {limit} bytes")]
    TooLarge { limit: u64 },
}

/// Last resort of the archive loader, for references that point outside of the archive.
pub trait NetworkFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError>;
}

pub fn is_network_address(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub struct UreqFetcher {
    agent: ureq::Agent,
    max_response_size: u64,
}

impl UreqFetcher {
    pub fn new(timeout: Duration, max_response_size: u64) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            max_response_size,
        }
    }
}

impl NetworkFetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        if !is_network_address(url) {
            return Err(NetworkError::NotAnAddress);
        }

        trace!("Fetching {}", url);
        let response = self.agent.get(url.trim()).call().map_err(Box::new)?;

        let mut buf = Vec::new();
        // one more byte than allowed, so we can tell a truncated body from one that fits exactly
        response
            .into_reader()
            .take(self.max_response_size + 1)
            .read_to_end(&mut buf)?;
        if buf.len() as u64 > self.max_response_size {
            return Err(NetworkError::TooLarge {
                limit: self.max_response_size,
            });
        }

        debug!("Fetched {} ({} bytes)", url, buf.len());
        Ok(buf)
    }
}

/// Used when network access is switched off, every fetch fails.
pub struct OfflineFetcher;

impl NetworkFetcher for OfflineFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, NetworkError> {
        Err(NetworkError::Disabled)
    }
}

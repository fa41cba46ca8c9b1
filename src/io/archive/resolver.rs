use crate::io::archive::index::PathIndex;
use log::{trace, warn};
use scenepack_files::archive::types::{Blob, BlobId, BlobSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Which step of the lookup chain produced a match, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchStep {
    FullReference,
    FileName,
    BaseDirRelative,
    PathSuffix,
    NameScan,
    /// Not a real match: the reference ends in `.bin` and we handed out a buffer from the pool.
    BufferPoolFallback,
}

impl Display for MatchStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            MatchStep::FullReference => "exact path",
            MatchStep::FileName => "exact file name",
            MatchStep::BaseDirRelative => "relative to the scene directory",
            MatchStep::PathSuffix => "path suffix",
            MatchStep::NameScan => "file name scan",
            MatchStep::BufferPoolFallback => "binary buffer fallback (heuristic)",
        };
        f.write_str(description)
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub blob: Arc<Blob>,
    pub step: MatchStep,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResolveHint {
    /// The `byteLength` a glTF buffer declares, used to pick among several binary buffers in the fallback.
    pub expected_len: Option<u64>,
}

/// Query component and fragment removed, backslashes turned into slashes, percent-decoded, lower-cased and
/// without leading `./` or `/`.
pub fn normalize_reference(reference: &str) -> String {
    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    let slashed = reference[..end].trim().replace('\\', "/");
    // Invalid escapes (e.g. a literal "100%.png") are kept as they are.
    let decoded = match urlencoding::decode(&slashed) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => slashed,
    };
    let lowered = decoded.to_lowercase();
    strip_leading_markers(&lowered).to_string()
}

fn strip_leading_markers(path: &str) -> &str {
    let mut trimmed = path;
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            return trimmed;
        }
    }
}

/// Joins the reference onto the base directory, collapsing `.` and `..` segments.
fn join_base_dir(base_dir: &str, reference: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base_dir.split('/').chain(reference.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Borrowing view over an extracted archive that maps reference strings to blobs.
pub struct ReferenceResolver<'a> {
    blobs: &'a BlobSet,
    index: &'a PathIndex,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(blobs: &'a BlobSet, index: &'a PathIndex) -> Self {
        Self { blobs, index }
    }

    pub fn resolve(&self, reference: &str, base_dir: &str) -> Option<Arc<Blob>> {
        self.resolve_detailed(reference, base_dir, ResolveHint::default())
            .map(|resolution| resolution.blob)
    }

    /// Runs the lookup chain, the first step that matches wins.
    pub fn resolve_detailed(&self, reference: &str, base_dir: &str, hint: ResolveHint) -> Option<Resolution> {
        let normalized = normalize_reference(reference);
        if normalized.is_empty() {
            return None;
        }

        let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);

        let found = self
            .lookup(&normalized)
            .map(|blob| (blob, MatchStep::FullReference))
            .or_else(|| self.lookup(file_name).map(|blob| (blob, MatchStep::FileName)))
            .or_else(|| {
                let base_dir = normalize_reference(base_dir);
                let joined = join_base_dir(&base_dir, &normalized);
                self.lookup(&joined)
                    .map(|blob| (blob, MatchStep::BaseDirRelative))
            })
            .or_else(|| {
                self.scan(|blob| blob.path.to_lowercase().ends_with(normalized.as_str()))
                    .map(|blob| (blob, MatchStep::PathSuffix))
            })
            .or_else(|| {
                self.scan(|blob| blob.name.to_lowercase() == file_name)
                    .map(|blob| (blob, MatchStep::NameScan))
            })
            .or_else(|| {
                if normalized.ends_with(".bin") {
                    self.buffer_fallback(reference, hint)
                        .map(|blob| (blob, MatchStep::BufferPoolFallback))
                } else {
                    None
                }
            });

        match found {
            Some((blob, step)) => {
                trace!("Resolved {} to {} ({})", reference, blob.path, step);
                Some(Resolution { blob, step })
            }
            None => {
                trace!("Could not resolve {} (base dir {:?})", reference, base_dir);
                None
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<Arc<Blob>> {
        self.index.get(key).and_then(|id| self.blob(id))
    }

    fn scan<P: Fn(&Blob) -> bool>(&self, predicate: P) -> Option<Arc<Blob>> {
        self.blobs
            .iter()
            .find(|blob| predicate(blob))
            .cloned()
    }

    fn blob(&self, id: BlobId) -> Option<Arc<Blob>> {
        self.blobs.get(id).cloned()
    }

    /// A bundle with a single `.bin` almost always means that buffer, no matter how it is referenced. With more
    /// than one this is a guess: prefer a buffer of the declared length, else the first in archive order.
    fn buffer_fallback(&self, reference: &str, hint: ResolveHint) -> Option<Arc<Blob>> {
        let pool = self.index.buffer_pool();
        let first = *pool.first()?;
        if pool.len() == 1 {
            return self.blob(first);
        }

        let by_length = hint.expected_len.and_then(|expected| {
            pool.iter()
                .copied()
                .find(|id| self.blob(*id).is_some_and(|blob| blob.bytes.len() as u64 == expected))
        });

        let chosen = self.blob(by_length.unwrap_or(first))?;
        warn!(
            "Guessing {} for {} among {} binary buffers{}",
            chosen.path,
            reference,
            pool.len(),
            if by_length.is_some() { " (byteLength matches)" } else { "" }
        );
        Some(chosen)
    }
}

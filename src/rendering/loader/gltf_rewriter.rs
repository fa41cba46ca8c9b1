use crate::io::archive::handles::HandleRegistry;
use crate::io::archive::resolver::ResolveHint;
use crate::io::archive::session::ArchiveSession;
use log::{debug, warn};
use scenepack_files::DocumentError;
use scenepack_files::archive::types::Blob;
use scenepack_files::gltf::reader::GltfReader;
use scenepack_files::gltf::types::{UriSection, is_data_uri};

/// A `uri` that stayed as it was because nothing in the archive matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub slot: String,
    pub uri: String,
}

#[derive(Debug, Default)]
pub struct RewriteReport {
    pub rewritten: usize,
    /// data: uris and content handles
    pub passed_through: usize,
    pub unresolved: Vec<UnresolvedReference>,
}

#[derive(Debug)]
pub struct RewrittenDocument {
    pub text: String,
    pub report: RewriteReport,
}

pub struct GltfRewriter<'a> {
    session: &'a ArchiveSession,
}

impl<'a> GltfRewriter<'a> {
    pub fn new(session: &'a ArchiveSession) -> Self {
        Self { session }
    }

    /// Points every resolvable `images[].uri` and `buffers[].uri` of the document at the content handle of the
    /// matching blob. Unresolvable uris stay untouched, a missing texture must not keep the geometry from loading.
    /// Rewriting an already rewritten document changes nothing.
    pub fn rewrite(&self, document: &Blob) -> Result<RewrittenDocument, DocumentError> {
        let mut gltf = GltfReader::parse_document(&document.bytes)?;
        let base_dir = document.base_dir();
        let resolver = self.session.resolver();
        let handles = self.session.handles();
        let mut report = RewriteReport::default();

        gltf.visit_uris_mut(|slot, uri| {
            if is_data_uri(uri) || HandleRegistry::is_handle(uri) {
                report.passed_through += 1;
                return;
            }

            let hint = ResolveHint {
                expected_len: match slot.section {
                    UriSection::Buffers => slot.byte_length,
                    UriSection::Images => None,
                },
            };

            let handle = resolver
                .resolve_detailed(uri, base_dir, hint)
                .and_then(|resolution| handles.handle_for(&resolution.blob));

            match handle {
                Some(handle) => {
                    debug!("{} {}: {} -> {}", document.path, slot, uri, handle.uri());
                    *uri = handle.uri().to_string();
                    report.rewritten += 1;
                }
                None => {
                    warn!("{} {}: could not resolve {}, leaving it as is", document.path, slot, uri);
                    report.unresolved.push(UnresolvedReference {
                        slot: slot.to_string(),
                        uri: uri.clone(),
                    });
                }
            }
        });

        Ok(RewrittenDocument {
            text: GltfReader::write_document(&gltf)?,
            report,
        })
    }
}

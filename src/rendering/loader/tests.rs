use crate::io::archive::handles::HandleRegistry;
use crate::io::archive::session::ArchiveSession;
use crate::io::common::loader::{LoadedResource, ResourceLoadError, ResourceLoader};
use crate::io::network::{NetworkError, NetworkFetcher};
use crate::rendering::hook::LoaderHook;
use crate::rendering::loader::archive_loader::ArchiveLoader;
use crate::rendering::loader::gltf_rewriter::{GltfRewriter, UnresolvedReference};
use crate::rendering::loader::scene_loader::SceneLoader;
use scenepack_files::DocumentError;
use scenepack_files::archive::types::{Blob, BlobId, BlobSet};
use serde_json::Value;
use std::sync::Arc;

const SCENE: &str = r#"{
    "asset": {"version": "2.0"},
    "buffers": [{"uri": "buffer.bin", "byteLength": 4}],
    "images": [
        {"uri": "tex.png"},
        {"uri": "Missing.png"},
        {"uri": "data:image/png;base64,iVBORw0KGgo="}
    ],
    "nodes": [{"name": "Duck", "mesh": 0}]
}"#;

fn session_with(scene: &str) -> ArchiveSession {
    let members: Vec<(String, Arc<[u8]>)> = vec![
        ("scene/model.gltf".to_string(), scene.as_bytes().to_vec().into()),
        ("scene/buffer.bin".to_string(), vec![1u8, 2, 3, 4].into()),
        ("textures/tex.png".to_string(), vec![0x89u8, b'P', b'N', b'G'].into()),
        ("notes/readme.txt".to_string(), b"made by hand".to_vec().into()),
    ];
    ArchiveSession::from_blobs(BlobSet::new(members).expect("contains a scene"))
}

fn uri_at(document: &Value, section: &str, index: usize) -> String {
    document[section][index]["uri"]
        .as_str()
        .expect("uri is a string")
        .to_string()
}

struct StubFetcher {
    body: Option<Vec<u8>>,
}

impl NetworkFetcher for StubFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, NetworkError> {
        self.body.clone().ok_or(NetworkError::Disabled)
    }
}

fn loader_with(session: ArchiveSession, body: Option<Vec<u8>>) -> ArchiveLoader {
    ArchiveLoader::with_fetcher(Arc::new(session), Arc::new(StubFetcher { body }))
}

#[test]
fn rewrites_resolvable_uris_to_content_handles() -> Result<(), anyhow::Error> {
    let session = session_with(SCENE);
    let rewritten = GltfRewriter::new(&session).rewrite(session.scene_document())?;
    let document: Value = serde_json::from_str(&rewritten.text)?;

    let buffer_handle = session
        .handles()
        .handle_for(session.blobs().get(BlobId(1)).unwrap())
        .unwrap();
    let texture_handle = session
        .handles()
        .handle_for(session.blobs().get(BlobId(2)).unwrap())
        .unwrap();

    assert_eq!(uri_at(&document, "buffers", 0), buffer_handle.uri());
    assert_eq!(uri_at(&document, "images", 0), texture_handle.uri());
    assert_eq!(uri_at(&document, "images", 1), "Missing.png");
    assert_eq!(uri_at(&document, "images", 2), "data:image/png;base64,iVBORw0KGgo=");
    assert_eq!(document["nodes"][0]["name"], "Duck");
    assert_eq!(document["buffers"][0]["byteLength"], 4);

    assert_eq!(rewritten.report.rewritten, 2);
    assert_eq!(rewritten.report.passed_through, 1);
    assert_eq!(
        rewritten.report.unresolved,
        vec![UnresolvedReference {
            slot: "images[1]".to_string(),
            uri: "Missing.png".to_string(),
        }]
    );
    Ok(())
}

#[test]
fn rewriting_is_idempotent() -> Result<(), anyhow::Error> {
    let session = session_with(SCENE);
    let rewriter = GltfRewriter::new(&session);

    let once = rewriter.rewrite(session.scene_document())?;
    let rewritten_blob = Blob::new(BlobId(0), "scene/model.gltf", once.text.as_bytes().to_vec());
    let twice = rewriter.rewrite(&rewritten_blob)?;
    assert_eq!(once.text, twice.text);
    assert_eq!(twice.report.rewritten, 0);
    assert_eq!(twice.report.passed_through, 3);

    // rewriting the original again reuses the handles issued the first time
    let again = rewriter.rewrite(session.scene_document())?;
    assert_eq!(once.text, again.text);
    assert_eq!(session.handles().live_count(), 2);
    Ok(())
}

#[test]
fn declared_byte_length_picks_between_misnamed_buffers() -> Result<(), anyhow::Error> {
    let scene = r#"{"buffers": [
        {"uri": "geometry.bin", "byteLength": 40},
        {"uri": "animation.bin", "byteLength": 100}
    ]}"#;
    let session = ArchiveSession::from_blobs(BlobSet::new(vec![
        ("export/scene.gltf".to_string(), scene.as_bytes().to_vec().into()),
        ("export/lod0.bin".to_string(), vec![0u8; 100].into()),
        ("export/lod1.bin".to_string(), vec![0u8; 40].into()),
    ])?);

    let rewritten = GltfRewriter::new(&session).rewrite(session.scene_document())?;
    let document: Value = serde_json::from_str(&rewritten.text)?;
    let handle_of = |id: usize| {
        session
            .handles()
            .handle_for(session.blobs().get(BlobId(id)).unwrap())
            .unwrap()
            .uri()
            .to_string()
    };

    assert_eq!(uri_at(&document, "buffers", 0), handle_of(2));
    assert_eq!(uri_at(&document, "buffers", 1), handle_of(1));
    Ok(())
}

#[test]
fn invalid_scene_document_is_reported() {
    let session = session_with("{ \"buffers\": [ ");
    let result = GltfRewriter::new(&session).rewrite(session.scene_document());
    assert!(matches!(result, Err(DocumentError::Parse(_))));

    let loader = loader_with(session_with("{ \"buffers\": [ "), None);
    match loader.load("scene/model.gltf") {
        Err(ResourceLoadError::Document { reference, .. }) => assert_eq!(reference, "scene/model.gltf"),
        other => panic!("Expected a document error, got {:?}", other),
    }
}

#[test]
fn loader_hands_out_the_rewritten_document() -> Result<(), anyhow::Error> {
    let loader = loader_with(session_with(SCENE), None);

    let LoadedResource::Text(text) = loader.load("SCENE/Model.gltf")? else {
        panic!("the scene document is text");
    };
    let document: Value = serde_json::from_str(&text)?;
    let buffer_uri = uri_at(&document, "buffers", 0);
    assert!(HandleRegistry::is_handle(&buffer_uri));

    // the handle is dereferenced without another resolution
    let buffer = loader.load(&buffer_uri)?;
    assert_eq!(buffer.as_bytes(), &[1, 2, 3, 4]);
    Ok(())
}

#[test]
fn scene_document_handle_loads_as_rewritten_text() -> Result<(), anyhow::Error> {
    let loader = loader_with(session_with(SCENE), None);
    let scene = loader.session().scene_document().clone();
    let handle = loader.session().handles().handle_for(&scene).unwrap();

    let LoadedResource::Text(text) = loader.load(handle.uri())? else {
        panic!("the scene document is text, even through its handle");
    };
    let document: Value = serde_json::from_str(&text)?;
    assert!(HandleRegistry::is_handle(&uri_at(&document, "buffers", 0)));
    assert!(HandleRegistry::is_handle(&uri_at(&document, "images", 0)));
    assert_eq!(uri_at(&document, "images", 1), "Missing.png");

    // everything else behind a handle stays raw bytes, even textual members
    let readme = loader.session().blobs().get(BlobId(3)).unwrap().clone();
    let readme_handle = loader.session().handles().handle_for(&readme).unwrap();
    assert!(matches!(
        loader.load(readme_handle.uri())?,
        LoadedResource::Bytes(bytes) if &*bytes == b"made by hand"
    ));
    Ok(())
}

#[test]
fn loader_serves_plain_references() -> Result<(), anyhow::Error> {
    let loader = loader_with(session_with(SCENE), None);

    assert!(matches!(loader.load("tex.png")?, LoadedResource::Bytes(bytes) if &*bytes == b"\x89PNG"));
    assert!(matches!(loader.load("../notes/readme.txt")?, LoadedResource::Text(text) if text == "made by hand"));
    Ok(())
}

#[test]
fn loader_falls_back_to_the_network_for_urls_only() {
    let online = loader_with(session_with(SCENE), Some(b"remote".to_vec()));
    let remote = online.load("https://example.com/assets/skybox.hdr").unwrap();
    assert_eq!(remote.as_bytes(), b"remote");

    match online.load("nowhere/skybox.hdr") {
        Err(ResourceLoadError::NotFound { reference }) => assert_eq!(reference, "nowhere/skybox.hdr"),
        other => panic!("Expected NotFound, got {:?}", other),
    }

    let offline = loader_with(session_with(SCENE), None);
    let err = offline
        .load("https://example.com/assets/skybox.hdr")
        .unwrap_err();
    assert!(matches!(err, ResourceLoadError::Network { .. }));
    assert_eq!(err.reference(), "https://example.com/assets/skybox.hdr");
}

#[test]
fn released_handles_no_longer_load() -> Result<(), anyhow::Error> {
    let loader = loader_with(session_with(SCENE), None);
    let texture = loader.session().blobs().get(BlobId(2)).unwrap().clone();
    let handle = loader.session().handles().handle_for(&texture).unwrap();
    assert_eq!(loader.load(handle.uri())?.as_bytes(), b"\x89PNG");

    assert_eq!(loader.session().release(), 1);
    assert!(matches!(
        loader.load(handle.uri()),
        Err(ResourceLoadError::Released { .. })
    ));
    Ok(())
}

#[test]
fn scene_loader_collects_missing_resources_without_failing() -> Result<(), anyhow::Error> {
    let loader: Arc<dyn ResourceLoader> = Arc::new(loader_with(session_with(SCENE), None));
    let scene = SceneLoader::new(loader).load("scene/model.gltf")?;

    assert_eq!(scene.buffers().count(), 1);
    assert_eq!(scene.images().count(), 1);
    assert_eq!(scene.buffers().next().unwrap().data.as_bytes(), &[1, 2, 3, 4]);
    assert_eq!(scene.missing.len(), 1);
    assert_eq!(scene.missing[0].reference(), "Missing.png");
    Ok(())
}

// The only test touching the process wide hook, so parallel tests can't observe each other.
#[test]
fn hook_guard_restores_the_previous_loader() -> Result<(), anyhow::Error> {
    assert!(LoaderHook::current().is_none());
    assert!(matches!(
        LoaderHook::load("tex.png"),
        Err(ResourceLoadError::NoLoader { .. })
    ));

    let outer: Arc<dyn ResourceLoader> = Arc::new(loader_with(session_with(SCENE), None));
    let outer_guard = LoaderHook::install(outer.clone());
    {
        let inner: Arc<dyn ResourceLoader> = Arc::new(loader_with(session_with("{}"), None));
        let _inner_guard = LoaderHook::install(inner.clone());
        assert!(Arc::ptr_eq(&LoaderHook::current().unwrap(), &inner));
    }
    assert!(Arc::ptr_eq(&LoaderHook::current().unwrap(), &outer));

    let scene = SceneLoader::from_hook()
        .expect("a loader is installed")
        .load("scene/model.gltf")?;
    assert_eq!(scene.assets.len(), 2);

    // also restored when the guarded code bails out early
    let failing = || -> Result<(), ResourceLoadError> {
        let _guard = LoaderHook::install(Arc::new(loader_with(session_with("{}"), None)));
        LoaderHook::load("does-not-exist.png")?;
        Ok(())
    };
    assert!(failing().is_err());
    assert!(Arc::ptr_eq(&LoaderHook::current().unwrap(), &outer));

    drop(outer_guard);
    assert!(LoaderHook::current().is_none());
    Ok(())
}

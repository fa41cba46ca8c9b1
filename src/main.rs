use anyhow::Context;
use clap::Parser;
use itertools::Itertools;
use log::{info, trace};
use scenepack::io::archive::resolver::ResolveHint;
use scenepack::io::archive::session::ArchiveSession;
use scenepack::io::common::loader::{LoadedResource, ResourceLoader};
use scenepack::rendering::loader::archive_loader::ArchiveLoader;
use scenepack::rendering::loader::gltf_rewriter::GltfRewriter;
use scenepack::rendering::loader::scene_loader::SceneLoader;
use scenepack::settings::{CliArgs, Command};
use scenepack_files::archive::types::BlobKind;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    trace!("Starting with args: {:?}", args);

    let archive_path = args.archive();
    let bytes =
        std::fs::read(archive_path).with_context(|| format!("Failed to read {}", archive_path.display()))?;
    let session = ArchiveSession::open(bytes, &args.extractor_settings())
        .await
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let session = Arc::new(session);

    let outcome = match &args.command {
        Command::Inspect { .. } => inspect(&session),
        Command::Resolve {
            reference, base_dir, ..
        } => resolve(&session, reference, base_dir.as_deref()),
        Command::Rewrite { output, .. } => {
            let rewritten = GltfRewriter::new(&session)
                .rewrite(session.scene_document())
                .with_context(|| format!("Failed to rewrite {}", session.scene_document().path))?;
            for unresolved in &rewritten.report.unresolved {
                eprintln!("unresolved {}: {}", unresolved.slot, unresolved.uri);
            }
            match output {
                Some(path) => std::fs::write(path, &rewritten.text)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", rewritten.text),
            }
            Ok(())
        }
        Command::Load { .. } => {
            let loader = ArchiveLoader::new(session.clone(), &args.loader_settings());
            let entry = loader.entry_reference().to_string();
            let loader: Arc<dyn ResourceLoader> = Arc::new(loader);
            let scene = SceneLoader::new(loader)
                .load(&entry)
                .with_context(|| format!("Failed to load the scene {}", entry))?;

            let kind = match scene.document {
                LoadedResource::Text(_) => "glTF",
                LoadedResource::Bytes(_) => "binary glTF",
            };
            println!("{} ({}, {} bytes)", entry, kind, scene.document.len());
            for asset in &scene.assets {
                println!("  {}[{}] {} bytes", asset.section, asset.index, asset.data.len());
            }
            for missing in &scene.missing {
                println!("  missing: {}", missing);
            }
            Ok(())
        }
    };

    outcome?;
    let released = session.release();
    info!("Done, released {} content handles", released);
    Ok(())
}

fn inspect(session: &ArchiveSession) -> anyhow::Result<()> {
    let blobs = session.blobs();
    println!(
        "{} members, {} scenes, primary scene {}",
        blobs.len(),
        blobs.scene_count(),
        session.scene_document().path
    );

    for blob in blobs.iter() {
        println!("{:>4} {:<15} {:>10}  {}", blob.id.0, blob.kind.to_string(), blob.bytes.len(), blob.path);
    }

    let pool = session
        .index()
        .buffer_pool()
        .iter()
        .filter_map(|id| blobs.get(*id))
        .map(|blob| blob.path.as_str())
        .join(", ");
    println!("{} index keys, binary buffers: [{}]", session.index().len(), pool);

    let buffers = blobs
        .iter()
        .filter(|blob| blob.kind == BlobKind::BinaryBuffer)
        .count();
    if buffers > 1 {
        println!("note: unmatched .bin references fall back to a guess among {} buffers", buffers);
    }
    Ok(())
}

fn resolve(session: &ArchiveSession, reference: &str, base_dir: Option<&str>) -> anyhow::Result<()> {
    let base_dir = base_dir.unwrap_or_else(|| session.scene_base_dir());
    let resolution = session
        .resolver()
        .resolve_detailed(reference, base_dir, ResolveHint::default())
        .with_context(|| format!("{} could not be resolved (base dir {:?})", reference, base_dir))?;

    println!(
        "{} -> {} ({}, {}, {} bytes)",
        reference,
        resolution.blob.path,
        resolution.step,
        resolution.blob.kind,
        resolution.blob.bytes.len()
    );
    Ok(())
}

/// Contrasting to the io layer, that only knows about blobs and paths, loaders are what a rendering pipeline
/// talks to. They call the resolver and hand out documents that are ready to be consumed.
pub mod archive_loader;
pub mod gltf_rewriter;
pub mod scene_loader;

#[cfg(test)]
mod tests;

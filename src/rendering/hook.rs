use crate::io::common::loader::{LoadedResource, ResourceLoadError, ResourceLoader};
use arc_swap::ArcSwapOption;
use log::trace;
use std::sync::Arc;

// arc-swap needs a sized payload, hence the wrapper around the trait object.
struct InstalledLoader(Arc<dyn ResourceLoader>);

static ACTIVE_LOADER: ArcSwapOption<InstalledLoader> = ArcSwapOption::const_empty();

/// Process wide loader slot for host pipelines that can't take a loader through their constructor.
/// Prefer passing the loader explicitly (see [`crate::rendering::loader::scene_loader::SceneLoader::new`]).
pub struct LoaderHook;

impl LoaderHook {
    /// Installs `loader` until the returned guard is dropped, which restores whatever was installed before,
    /// also when unwinding. Guards have to be dropped in reverse order of installation.
    #[must_use = "the previous loader is restored as soon as the guard is dropped"]
    pub fn install(loader: Arc<dyn ResourceLoader>) -> LoaderGuard {
        let previous = ACTIVE_LOADER.swap(Some(Arc::new(InstalledLoader(loader))));
        trace!("Installed loader hook (replacing one: {})", previous.is_some());
        LoaderGuard { previous }
    }

    pub fn current() -> Option<Arc<dyn ResourceLoader>> {
        ACTIVE_LOADER
            .load_full()
            .map(|installed| installed.0.clone())
    }

    pub fn load(reference: &str) -> Result<LoadedResource, ResourceLoadError> {
        match Self::current() {
            Some(loader) => loader.load(reference),
            None => Err(ResourceLoadError::NoLoader {
                reference: reference.to_string(),
            }),
        }
    }
}

pub struct LoaderGuard {
    previous: Option<Arc<InstalledLoader>>,
}

impl Drop for LoaderGuard {
    fn drop(&mut self) {
        trace!("Restoring previous loader hook (present: {})", self.previous.is_some());
        ACTIVE_LOADER.store(self.previous.take());
    }
}

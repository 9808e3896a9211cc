//! Script library loader
//!
//! Loads game-script shared libraries and resolves exported functions from
//! them. Libraries stay loaded for the lifetime of the loader; symbols
//! resolved from a library must not outlive it.

// Loading foreign code and naming its symbols is inherently unsafe; this is
// the only module allowed to do it.
#![allow(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use slotmap::{new_key_type, SlotMap};

use crate::foundation::logging::Logger;
use crate::{log_error, log_info};

new_key_type! {
    /// Handle to a loaded library
    pub struct LibraryHandle;
}

struct LoadedLibrary {
    path: PathBuf,
    library: Library,
}

/// Loads shared libraries and looks up their exports
pub struct ScriptLoader {
    logger: Arc<Logger>,
    libraries: SlotMap<LibraryHandle, LoadedLibrary>,
}

impl ScriptLoader {
    /// Create a loader that reports failures through `logger`
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            libraries: SlotMap::with_key(),
        }
    }

    /// Load a shared library
    ///
    /// Failures are logged and return `None`. Library initializers run on
    /// load, so only load trusted libraries.
    pub fn load_library(&mut self, path: impl AsRef<Path>) -> Option<LibraryHandle> {
        let path = path.as_ref();
        // SAFETY: initialization routines of the library run here; script
        // libraries are trusted engine content.
        match unsafe { Library::new(path) } {
            Ok(library) => {
                log_info!(self.logger, "Loaded script library {}", path.display());
                Some(self.libraries.insert(LoadedLibrary {
                    path: path.to_path_buf(),
                    library,
                }))
            }
            Err(error) => {
                log_error!(
                    self.logger,
                    "Failed to load library {}: {}",
                    path.display(),
                    error
                );
                None
            }
        }
    }

    /// Resolve an exported symbol as a value of type `T`
    ///
    /// Failures are logged and return `None`.
    ///
    /// # Safety
    ///
    /// `T` must match the actual type of the exported symbol (typically an
    /// `extern "C" fn` pointer), and the returned value must not be used
    /// after this loader is dropped.
    pub unsafe fn get_function<T: Copy>(&self, name: &str, handle: LibraryHandle) -> Option<T> {
        let Some(loaded) = self.libraries.get(handle) else {
            log_error!(self.logger, "Failed to find function {}: unknown library", name);
            return None;
        };

        // SAFETY: the caller guarantees `T` is the symbol's real type.
        match unsafe { loaded.library.get::<T>(name.as_bytes()) } {
            Ok(symbol) => Some(*symbol),
            Err(error) => {
                log_error!(
                    self.logger,
                    "Failed to find function {} in {}: {}",
                    name,
                    loaded.path.display(),
                    error
                );
                None
            }
        }
    }

    /// Path a library was loaded from
    pub fn path(&self, handle: LibraryHandle) -> Option<&Path> {
        self.libraries.get(handle).map(|loaded| loaded.path.as_path())
    }

    /// Number of loaded libraries
    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }
}

impl std::fmt::Debug for ScriptLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paths: Vec<&Path> = self
            .libraries
            .values()
            .map(|loaded| loaded.path.as_path())
            .collect();
        f.debug_struct("ScriptLoader").field("libraries", &paths).finish()
    }
}

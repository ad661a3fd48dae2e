//! Dynamic plugin loading.
//!
//! For each library the host appends a name-only registry entry, opens the
//! shared object, calls its exported `tank_plugin_entry` with the matching
//! registrar, and validates the registration. On any failure the entry is
//! rolled back and the library dropped; on success the handle is retained for
//! the life of the host, which must outlive every worker thread and every
//! `GameResult` produced by plugin code.

use std::path::{Path, PathBuf};

use battle_interface::plugin::{PluginEntryFn, PLUGIN_ENTRY_SYMBOL};
use libloading::Library;
use thiserror::Error;
use tracing::{debug, warn};

use crate::registry::{AlgorithmRegistrar, GameManagerRegistrar, RegistrationError};

#[derive(Debug, Error)]
pub enum PluginLoadError {
    #[error("cannot load plugin {path}: {source}")]
    Open {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("plugin {path} does not export a plugin entry: {source}")]
    MissingEntry {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Owns both registrars and the loaded library handles.
#[derive(Default)]
pub struct PluginHost {
    pub algorithms: AlgorithmRegistrar,
    pub game_managers: GameManagerRegistrar,
    libraries: Vec<Library>,
}

/// Plugin name: the library file name without extension.
pub fn plugin_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl PluginHost {
    pub fn new() -> PluginHost {
        PluginHost::default()
    }

    /// Load an algorithm plugin; it must register a player factory and a
    /// tank-algorithm factory, each exactly once.
    pub fn load_algorithm(&mut self, path: &Path) -> Result<(), PluginLoadError> {
        let name = plugin_name(path);
        debug!(name, path = %path.display(), "loading algorithm plugin");
        self.algorithms.begin_registration(&name);
        let library = Self::open_and_register(path, &mut self.algorithms)
            .inspect_err(|_| self.algorithms.abort_pending())?;
        self.algorithms.finish_registration()?;
        self.libraries.push(library);
        Ok(())
    }

    /// Load a game-manager plugin; it must register a game-manager factory
    /// exactly once.
    pub fn load_game_manager(&mut self, path: &Path) -> Result<(), PluginLoadError> {
        let name = plugin_name(path);
        debug!(name, path = %path.display(), "loading game manager plugin");
        self.game_managers.begin_registration(&name);
        let library = Self::open_and_register(path, &mut self.game_managers)
            .inspect_err(|_| self.game_managers.abort_pending())?;
        self.game_managers.finish_registration()?;
        self.libraries.push(library);
        Ok(())
    }

    fn open_and_register(
        path: &Path,
        registrar: &mut dyn battle_interface::plugin::PluginRegistrar,
    ) -> Result<Library, PluginLoadError> {
        // Safety: plugins are trusted code built against the same
        // battle-interface with the same toolchain; their initializers run on
        // load like any linked library's would.
        let library = unsafe { Library::new(path) }.map_err(|source| {
            warn!(path = %path.display(), %source, "dlopen failed");
            PluginLoadError::Open { path: path.to_path_buf(), source }
        })?;
        let entry = unsafe { library.get::<PluginEntryFn>(PLUGIN_ENTRY_SYMBOL) }.map_err(
            |source| PluginLoadError::MissingEntry { path: path.to_path_buf(), source },
        )?;
        unsafe { entry(registrar) };
        drop(entry);
        Ok(library)
    }

    /// Number of retained library handles.
    pub fn loaded_libraries(&self) -> usize {
        self.libraries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::consts::DLL_EXTENSION;

    #[test]
    fn missing_library_rolls_back_the_entry() {
        let mut host = PluginHost::new();
        let err = host.load_algorithm(Path::new("/nonexistent/plugin.so")).unwrap_err();
        assert!(matches!(err, PluginLoadError::Open { .. }));
        assert!(host.algorithms.is_empty());
        assert_eq!(host.loaded_libraries(), 0);
    }

    #[test]
    fn garbage_library_rolls_back_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("fake.{DLL_EXTENSION}"));
        std::fs::write(&path, b"this is not a shared object").unwrap();

        let mut host = PluginHost::new();
        let err = host.load_game_manager(&path).unwrap_err();
        assert!(matches!(err, PluginLoadError::Open { .. }));
        assert!(host.game_managers.is_empty());
        assert_eq!(host.loaded_libraries(), 0);
    }

    #[test]
    fn plugin_names_strip_the_extension() {
        assert_eq!(plugin_name(Path::new("plugins/libhunter.so")), "libhunter");
        assert_eq!(plugin_name(Path::new("referee")), "referee");
    }
}

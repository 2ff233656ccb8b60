//! Configuration module for tagtile.
//!
//! This module turns a configuration file into a [`ConfigModel`]:
//!
//! - [`loader`] finds and parses the JSONC document
//! - [`document`] is the serde shape of that document
//! - [`builder`] validates and compiles it, collecting [`ConfigIssue`]s
//! - [`watcher`] reports edits so the engine can reload
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

pub mod builder;
pub mod defaults;
pub mod document;
pub mod issues;
pub mod loader;
pub mod template;
mod watcher;

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub use builder::{BuildOutput, ModelBuilder, build};
pub use document::ConfigDocument;
pub use issues::ConfigIssue;
pub use loader::{
    ConfigError, LoadedDocument, config_paths, default_document, expand_path, find_config_file,
    load_document, load_document_from_path, parse_document,
};
use parking_lot::RwLock;
pub use watcher::{ConfigWatcher, watch_config_file};

use crate::engine::model::ConfigModel;

/// Custom config path override (set via CLI --config flag).
static CUSTOM_CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets a custom configuration file path to use instead of the default search paths.
///
/// This must be called before the first [`ConfigStore::load`] to take effect.
///
/// # Arguments
///
/// * `path` - The path to the custom configuration file
///
/// # Returns
///
/// `true` if the path was set successfully, `false` if a path was already set.
pub fn set_custom_config_path(path: PathBuf) -> bool { CUSTOM_CONFIG_PATH.set(path).is_ok() }

/// Returns the custom configuration path, if one was set.
#[must_use]
pub fn custom_config_path() -> Option<&'static Path> {
    CUSTOM_CONFIG_PATH.get().map(PathBuf::as_path)
}

/// A compiled model together with the issues found while building it.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: Arc<ConfigModel>,
    pub issues: Vec<ConfigIssue>,
    /// `None` when the stock configuration was used.
    pub path: Option<PathBuf>,
}

/// Loads and compiles the configuration.
///
/// Uses `custom` when given, then the path set with
/// [`set_custom_config_path`], then the search paths, then the stock document.
///
/// # Errors
///
/// Returns an error if the selected file cannot be read or parsed. Semantic
/// problems are not errors; they are returned as issues.
pub fn load_model(custom: Option<&Path>) -> Result<LoadedModel, ConfigError> {
    let loaded = load_document(custom.or_else(|| custom_config_path()))?;
    let BuildOutput { model, issues } = build(&loaded.document);

    Ok(LoadedModel { model: Arc::new(model), issues, path: loaded.path })
}

/// The currently active model.
///
/// Readers take a cheap `Arc` snapshot; a reload swaps the whole model.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    model: RwLock<Arc<ConfigModel>>,
}

impl ConfigStore {
    /// Loads the configuration and wraps it in a store.
    ///
    /// # Errors
    ///
    /// See [`load_model`].
    pub fn load(custom: Option<&Path>) -> Result<(Self, Vec<ConfigIssue>), ConfigError> {
        let loaded = load_model(custom)?;
        let store = Self { path: loaded.path, model: RwLock::new(loaded.model) };
        Ok((store, loaded.issues))
    }

    /// Creates a store around an already built model.
    #[must_use]
    pub fn from_model(model: ConfigModel, path: Option<PathBuf>) -> Self {
        Self { path, model: RwLock::new(Arc::new(model)) }
    }

    /// Returns a snapshot of the active model.
    #[must_use]
    pub fn current(&self) -> Arc<ConfigModel> { Arc::clone(&self.model.read()) }

    /// The file the model was loaded from.
    #[must_use]
    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    /// Reads the file again and swaps in the new model.
    ///
    /// The active model stays in place when the file cannot be read or parsed.
    ///
    /// # Errors
    ///
    /// Returns the load error; the previous model remains active.
    pub fn reload(&self) -> Result<LoadedModel, ConfigError> {
        let loaded = match &self.path {
            Some(path) => load_model(Some(path))?,
            None => {
                let BuildOutput { model, issues } = build(&default_document());
                LoadedModel { model: Arc::new(model), issues, path: None }
            }
        };

        self.replace(Arc::clone(&loaded.model));
        tracing::info!(issues = loaded.issues.len(), "configuration reloaded");
        Ok(loaded)
    }

    /// Replaces the active model.
    pub fn replace(&self, model: Arc<ConfigModel>) { *self.model.write() = model; }
}

/// Builds a model from a JSONC string, for tests.
///
/// # Panics
///
/// Panics if the string is not a valid document.
#[cfg(test)]
#[must_use]
pub fn build_model(json: &str) -> ConfigModel {
    build(&parse_document(json).expect("test configuration should parse")).model
}

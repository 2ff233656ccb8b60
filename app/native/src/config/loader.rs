//! Configuration discovery and loading.
//!
//! The file supports JSONC format (JSON with comments). Both single-line
//! (`//`) and multi-line (`/* */`) comments are stripped before parsing.

use std::fs;
use std::path::{Path, PathBuf};

use super::document::ConfigDocument;
use super::template::generate_config_template;

/// Errors that can occur when loading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    NotFound(Option<PathBuf>),
    /// The configuration file exists but could not be read.
    Io(std::io::Error),
    /// The configuration file is not a valid document.
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(Some(path)) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            Self::NotFound(None) => write!(
                f,
                "No configuration file found. Expected at ~/.config/tagtile/config.jsonc \
                or ~/.tagtile.jsonc"
            ),
            Self::Io(err) => write!(f, "Failed to read configuration file: {err}"),
            Self::Parse(err) => write!(f, "Failed to parse configuration file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self { Self::Io(err) }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self { Self::Parse(err) }
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Dotfile names in the home directory.
const HOME_CONFIG_FILE_NAMES: &[&str] = &[".tagtile.jsonc", ".tagtile.json"];

const APP_DIR: &str = "tagtile";

/// Returns the possible configuration file paths in priority order.
///
/// The function checks the following locations (both `.jsonc` and `.json` variants):
/// 1. `$XDG_CONFIG_HOME/tagtile/config.jsonc` if the variable is set
/// 2. `~/.config/tagtile/config.jsonc`
/// 3. The platform configuration directory, e.g.
///    `~/Library/Application Support/tagtile/config.jsonc` on macOS
/// 4. `~/.tagtile.jsonc`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let dir = PathBuf::from(xdg_config).join(APP_DIR);
        for filename in CONFIG_FILE_NAMES {
            paths.push(dir.join(filename));
        }
    }

    if let Some(home) = dirs::home_dir() {
        let dir = home.join(".config").join(APP_DIR);
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            // XDG_CONFIG_HOME might be ~/.config
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let dir = config_dir.join(APP_DIR);
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        for filename in HOME_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Expands `~` in a user supplied path.
#[must_use]
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return PathBuf::new();
    }
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Parses a JSONC document.
///
/// # Errors
///
/// Returns the parse error for invalid JSON or a document of the wrong shape.
pub fn parse_document(source: &str) -> Result<ConfigDocument, serde_json::Error> {
    let reader = json_comments::StripComments::new(source.as_bytes());
    serde_json::from_reader(reader)
}

/// Loads a document from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist,
/// `ConfigError::Io` if it cannot be read and `ConfigError::Parse` if it is
/// not a valid document.
pub fn load_document_from_path(path: &Path) -> Result<ConfigDocument, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(Some(path.to_path_buf())));
    }

    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Returns the first existing file among [`config_paths`].
#[must_use]
pub fn find_config_file() -> Option<PathBuf> { config_paths().into_iter().find(|path| path.exists()) }

/// The stock document, used when no file exists.
#[must_use]
pub fn default_document() -> ConfigDocument {
    parse_document(&generate_config_template()).unwrap_or_else(|err| {
        tracing::error!(error = %err, "stock configuration does not parse, using an empty document");
        ConfigDocument::default()
    })
}

/// A loaded document and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: ConfigDocument,
    /// `None` for the stock document.
    pub path: Option<PathBuf>,
}

/// Loads the document from `custom`, or from the first discovered file, or
/// falls back to the stock document.
///
/// # Errors
///
/// Returns an error if `custom` does not exist, or if the selected file
/// cannot be read or parsed.
pub fn load_document(custom: Option<&Path>) -> Result<LoadedDocument, ConfigError> {
    let path = match custom {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    match path {
        Some(path) => {
            let document = load_document_from_path(&path)?;
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(LoadedDocument { document, path: Some(path) })
        }
        None => {
            tracing::debug!("no configuration file found, using the stock configuration");
            Ok(LoadedDocument { document: default_document(), path: None })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_config_paths_are_not_empty() {
        let paths = config_paths();
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|path| {
            path.file_name().is_some_and(|name| name.to_string_lossy().contains("json"))
        }));
    }

    #[test]
    fn test_parse_document_strips_comments() {
        let document = parse_document(
            r#"{
                // line comment
                "options": { /* block */ "step": 7 }
            }"#,
        )
        .unwrap();
        assert_eq!(document.options.step, Some(7));
    }

    #[test]
    fn test_load_document_from_custom_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "options": {{ "snap": 3 }} }} // trailing"#).unwrap();

        let loaded = load_document(Some(file.path())).unwrap();
        assert_eq!(loaded.document.options.snap, Some(3));
        assert_eq!(loaded.path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_custom_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(Some(&dir.path().join("missing.jsonc"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(Some(_))));
        assert!(err.to_string().contains("missing.jsonc"));
    }

    #[test]
    fn test_invalid_document_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "options": {{ "step": "fast" }} }}"#).unwrap();

        let err = load_document_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_default_document_is_the_template() {
        let document = default_document();
        assert!(!document.grabs.is_empty());
        assert_eq!(document.options.default_tag.as_deref(), Some("default"));
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/etc/tagtile.jsonc"), PathBuf::from("/etc/tagtile.jsonc"));
        assert!(!expand_path("~/x.jsonc").to_string_lossy().starts_with('~'));
        assert_eq!(expand_path("  "), PathBuf::new());
    }
}

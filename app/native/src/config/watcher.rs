//! Configuration file watcher for hot-reloading.
//!
//! The watcher observes the configuration file's parent directory and calls
//! back once per save. The callback usually rebuilds the model and sends it
//! to the engine.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// Debounce duration for config file changes.
/// Some editors trigger multiple events per save (write to temp, rename, etc.).
const CONFIG_DEBOUNCE_MS: u64 = 200;

/// Filters and debounces file system events for one configuration file.
#[derive(Debug, Clone)]
pub struct ConfigWatcher {
    filename: OsString,
    debounce: Duration,
    last_event: Option<Instant>,
}

impl ConfigWatcher {
    /// Creates a filter for `path` with the default debounce.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            filename: path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default(),
            debounce: Duration::from_millis(CONFIG_DEBOUNCE_MS),
            last_event: None,
        }
    }

    /// Whether an event touches the watched file.
    #[must_use]
    pub fn affects(&self, event: &notify::Event) -> bool {
        event.paths.iter().any(|p| p.file_name().is_some_and(|name| name == self.filename))
    }

    /// Records an event at `now` and returns whether it should trigger a reload.
    ///
    /// Events inside the debounce window of the last accepted event are dropped.
    pub fn accept(&mut self, now: Instant) -> bool {
        if self.last_event.is_some_and(|t| now.duration_since(t) < self.debounce) {
            return false;
        }
        self.last_event = Some(now);
        true
    }
}

/// Starts watching the configuration file for changes.
///
/// Spawns a background thread that calls `on_change` after each debounced
/// edit. The thread ends when `on_change` returns `false`.
///
/// # Arguments
///
/// * `config_path` - The configuration file to watch
/// * `on_change` - Called on every accepted change
///
/// # Returns
///
/// The thread handle, or `None` if the file has no parent directory.
pub fn watch_config_file<F>(config_path: PathBuf, mut on_change: F) -> Option<JoinHandle<()>>
where
    F: FnMut() -> bool + Send + 'static,
{
    let watch_path = config_path.parent().map(Path::to_path_buf)?;

    let handle = std::thread::spawn(move || {
        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
            Ok(w) => w,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create config watcher");
                return;
            }
        };

        // Watch the parent directory to catch file replacements
        // (some editors save by writing to a temp file then renaming)
        if let Err(err) = watcher.watch(&watch_path, RecursiveMode::NonRecursive) {
            tracing::warn!(error = %err, path = %watch_path.display(), "failed to watch config file");
            return;
        }

        tracing::debug!(path = %config_path.display(), "watching configuration file");
        let mut filter = ConfigWatcher::new(&config_path);

        loop {
            match rx.recv() {
                Ok(Ok(event)) => {
                    if !filter.affects(&event) || !filter.accept(Instant::now()) {
                        continue;
                    }

                    tracing::info!(path = %config_path.display(), "configuration file changed");
                    if !on_change() {
                        break;
                    }
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "config watch error");
                }
                // Channel closed, watcher dropped
                Err(_) => break,
            }
        }
    });

    Some(handle)
}

//! `tagtile watch`: run the engine headless.
//!
//! Starts the engine actor without a display server, reloading the model
//! whenever the configuration file changes. Useful to try hooks and key
//! chains, and to see reload diagnostics while editing.

use std::sync::Arc;

use clap::Args;

use super::report_issues;
use crate::config::{ConfigStore, custom_config_path, watch_config_file};
use crate::engine::state::Rect;
use crate::engine::{
    CallbackRegistry, EngineActor, EngineHandle, EngineMessage, HeadlessWindowSystem, Runtime,
};
use crate::error::EngineError;

/// Arguments for `tagtile watch`.
#[derive(Args, Debug)]
#[command(after_long_help = r#"Examples:
  tagtile watch
  tagtile watch --screen 1920x1080 --screen 1280x1024+1920+0
  RUST_LOG=tagtile=debug tagtile watch"#)]
pub struct WatchArgs {
    /// Screen geometry, repeat for more screens.
    #[arg(long = "screen", short, value_name = "WxH+X+Y")]
    pub screens: Vec<Rect>,

    /// Do not reload when the configuration file changes.
    #[arg(long)]
    pub no_reload: bool,
}

/// Execute `tagtile watch`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the async
/// runtime cannot be created.
pub fn execute(args: &WatchArgs) -> Result<(), EngineError> {
    let (store, issues) = ConfigStore::load(custom_config_path())?;
    report_issues(&issues);
    let store = Arc::new(store);

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(run(store, args))
}

async fn run(store: Arc<ConfigStore>, args: &WatchArgs) -> Result<(), EngineError> {
    let runtime =
        Runtime::new(store.current(), CallbackRegistry::new(), Box::new(HeadlessWindowSystem));
    let (actor, handle) = EngineActor::new(runtime, Some(Arc::clone(&store)));
    let mut task = tokio::spawn(actor.run());

    if !args.screens.is_empty() {
        handle.set_screens(args.screens.clone())?;
    }

    match (args.no_reload, store.path()) {
        (false, Some(path)) => {
            let watched = Arc::clone(&store);
            let sender = handle.clone();
            watch_config_file(path.to_path_buf(), move || reload_on_change(&watched, &sender));
        }
        (false, None) => tracing::info!("no configuration file, reload on change disabled"),
        (true, _) => {}
    }

    tracing::info!("engine running, press Ctrl-C to stop");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            log_final_state(&handle).await;
            handle.shutdown()?;
            task.await.map_err(|err| EngineError::ActorError(err.to_string()))?;
        }
        result = &mut task => {
            result.map_err(|err| EngineError::ActorError(err.to_string()))?;
            tracing::info!("engine stopped");
        }
    }

    Ok(())
}

/// Rebuilds the model and hands it to the engine.
///
/// Returns `false` once the engine is gone, which stops the watcher.
fn reload_on_change(store: &ConfigStore, handle: &EngineHandle) -> bool {
    match store.reload() {
        Ok(loaded) => {
            report_issues(&loaded.issues);
            handle.send_blocking(EngineMessage::Reload(loaded.model)).is_ok()
        }
        Err(err) => {
            tracing::warn!(error = %err, "keeping the previous configuration");
            handle.is_alive()
        }
    }
}

async fn log_final_state(handle: &EngineHandle) {
    match handle.snapshot().await {
        Ok(snapshot) => tracing::info!(
            clients = snapshot.clients.len(),
            screens = snapshot.screens.len(),
            views = ?snapshot.visible_views,
            "stopping engine"
        ),
        Err(err) => tracing::debug!(error = %err, "engine state unavailable"),
    }
}

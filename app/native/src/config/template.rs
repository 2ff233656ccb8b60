//! Stock configuration.
//!
//! The template is a complete, working configuration. It is written by
//! `tagtile config init` and used as the document when no file exists.

use std::fs;
use std::path::Path;

/// Returns the stock configuration as commented JSONC.
#[must_use]
pub fn generate_config_template() -> String {
    r##"// tagtile configuration
// =====================
// This file uses JSONC format (JSON with comments).
// Unset options take the defaults of the selected profile.
//
// Schema: run `tagtile schema > tagtile.schema.json`

{
  // "current" or "legacy"
  "defaults": "current",

  // ==========================================================================
  // Options
  // ==========================================================================
  "options": {
    // Window move/resize steps in pixels per key press
    "step": 5,

    // Window screen border snapping
    "snap": 10,

    // Default starting gravity for windows
    "gravity": "center",

    // Make transient windows urgent
    "urgent": false,

    // Honor resize size hints globally
    "resize": false,

    // Font string, either X Logical Font Description or Xft
    "font": "-*-*-medium-*-*-*-14-*-*-*-*-*-*-*",

    // Separator between sublets
    "separator": "|",

    // Timeout in milliseconds before an ambiguous key chain fires
    "chainTimeoutMs": 1000,

    // Tag for windows no tag matches (added automatically when undeclared)
    "defaultTag": "default"
  },

  // ==========================================================================
  // Screens
  // ==========================================================================
  // Panel items: views, title, tray, keychain, sublets, separator, spacer,
  // center (toggles a centered group), sublet:<name>
  "screens": [
    {
      "top": ["views", "title", "spacer", "keychain", "spacer", "tray", "sublets"],
      "bottom": []
    }
  ],

  // ==========================================================================
  // Styles (passed to the renderer)
  // ==========================================================================
  "styles": {
    "title": { "foreground": "#fecf35", "background": "#202020" },
    "focus": { "foreground": "#fecf35", "background": "#202020" },
    "urgent": { "foreground": "#ff9800", "background": "#202020" },
    "occupied": { "foreground": "#b8b8b8", "background": "#202020" },
    "views": { "foreground": "#757575", "background": "#202020" },
    "sublets": { "foreground": "#757575", "background": "#202020" },
    "separator": { "foreground": "#757575", "background": "#202020" },
    "clients": { "active": ["#303030", 2], "inactive": ["#202020", 2], "margin": 0 },
    "subtle": { "panel": "#202020", "background": "#3d3d3d", "stipple": "#757575" }
  },

  // ==========================================================================
  // Gravities
  // ==========================================================================
  // The built-in table (top_left, top_left66, ... bottom_right33 and the
  // gimp_* gravities) is always available. Entries here add to it or
  // replace built-ins with the same name: [x, y, width, height] in percent.
  "gravities": {
    "gimp_image": [50, 50, 80, 100]
  },

  // ==========================================================================
  // Grabs
  // ==========================================================================
  // Modifiers: A (Alt), C (Control), M (Meta), S (Shift), W (Super).
  // Buttons: B1..B5. Chains are space separated: "C-y Return".
  "grabs": {
    "W-S-1": "ViewJump1",
    "W-S-2": "ViewJump2",
    "W-S-3": "ViewJump3",
    "W-S-4": "ViewJump4",

    "W-1": "ViewSwitch1",
    "W-2": "ViewSwitch2",
    "W-3": "ViewSwitch3",
    "W-4": "ViewSwitch4",

    "KP_Add": "ViewNext",
    "KP_Subtract": "ViewPrev",

    "W-A-1": "ScreenJump1",
    "W-A-2": "ScreenJump2",
    "W-A-3": "ScreenJump3",
    "W-A-4": "ScreenJump4",

    "W-C-r": "SubtleReload",
    "W-C-S-r": "SubtleRestart",
    "W-C-q": "SubtleQuit",

    "W-B1": "WindowMove",
    "W-B3": "WindowResize",
    "W-f": "WindowFloat",
    "W-space": "WindowFull",
    "W-s": "WindowStick",
    "W-r": "WindowRaise",
    "W-l": "WindowLower",

    "W-Left": "WindowLeft",
    "W-Down": "WindowDown",
    "W-Up": "WindowUp",
    "W-Right": "WindowRight",

    "W-S-k": "WindowKill",

    "A-S-1": "WindowScreen1",
    "A-S-2": "WindowScreen2",
    "A-S-3": "WindowScreen3",
    "A-S-4": "WindowScreen4",

    // Gravity cycles
    "W-KP_7": ["top_left", "top_left66", "top_left33"],
    "W-KP_8": ["top", "top66", "top33"],
    "W-KP_9": ["top_right", "top_right66", "top_right33"],
    "W-KP_4": ["left", "left66", "left33"],
    "W-KP_5": ["center", "center66", "center33"],
    "W-KP_6": ["right", "right66", "right33"],
    "W-KP_1": ["bottom_left", "bottom_left66", "bottom_left33"],
    "W-KP_2": ["bottom", "bottom66", "bottom33"],
    "W-KP_3": ["bottom_right", "bottom_right66", "bottom_right33"],

    // Programs
    "W-Return": "urxvt",

    // Registered callbacks
    "S-F2": { "callback": "print_name" }
  },

  // ==========================================================================
  // Tags
  // ==========================================================================
  "tags": {
    "terms": "xterm|[u]?rxvt",
    "browser": "uzbl|opera|firefox|navigator",
    "editor": { "match": "[g]?vim", "resize": true },
    "fixed": { "geometry": [10, 10, 100, 100], "stick": true },
    "resize": { "match": "sakura|gvim", "resize": true },
    "gravity": { "gravity": "center" },
    "stick": { "match": "mplayer", "float": true, "stick": true },
    "float": { "match": "display", "float": true },
    "gimp_image": { "match": { "role": "gimp-image-window" }, "gravity": "gimp_image" },
    "gimp_toolbox": { "match": { "role": "gimp-toolbox$" }, "gravity": "gimp_toolbox" },
    "gimp_dock": { "match": { "role": "gimp-dock" }, "gravity": "gimp_dock" }
  },

  // ==========================================================================
  // Views
  // ==========================================================================
  "views": {
    "terms": "terms|default",
    "www": "browser",
    "gimp": { "match": "gimp_.*", "dynamic": true },
    "dev": "editor"
  },

  // ==========================================================================
  // Sublets
  // ==========================================================================
  "sublets": {},

  // ==========================================================================
  // Hooks
  // ==========================================================================
  // Event names: client_create, client_configure, client_focus, client_kill,
  // tag_create, tag_kill, view_create, view_configure, view_jump, view_kill,
  // tile, reload, start, exit
  "hooks": {}
}
"##
    .to_string()
}

/// Writes the template to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build, parse_document};
    use crate::engine::model::GrabAction;

    #[test]
    fn test_template_builds_without_issues() {
        let document = parse_document(&generate_config_template()).unwrap();
        let output = build(&document);
        assert!(output.issues.is_empty(), "{:?}", output.issues);
    }

    #[test]
    fn test_template_contains_stock_rules() {
        let document = parse_document(&generate_config_template()).unwrap();
        let model = build(&document).model;

        assert_eq!(model.views().len(), 4);
        assert_eq!(model.tag(model.default_tag()).name(), "default");
        assert!(model.view_by_name("gimp").unwrap().is_dynamic());

        let cycles = model
            .grabs()
            .iter()
            .filter(|grab| matches!(grab.action(), GrabAction::GravityCycle(_)))
            .count();
        assert_eq!(cycles, 9);
    }

    #[test]
    fn test_create_config_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.jsonc");
        create_config_file(&path).unwrap();
        assert!(path.exists());
    }
}

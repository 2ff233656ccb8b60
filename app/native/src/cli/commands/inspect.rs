//! Read-only queries against the active configuration.
//!
//! These commands build the model and run one engine operation on it without
//! touching any window system: how a window would be matched and placed,
//! where a gravity lands, what a key chain fires and how a panel is laid out.

use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use super::ScreenIndex;
use crate::cli::output;
use crate::engine::chain::{ChainMachine, ChainState};
use crate::engine::gravity::{apply_gravity, resolve};
use crate::engine::model::{
    ConfigModel, GrabAction, GrabId, WindowAttributes, WindowType, format_chain, parse_chain,
};
use crate::engine::panel::{PanelCell, PanelLayout};
use crate::engine::placement::place;
use crate::engine::runtime::FALLBACK_SCREEN;
use crate::engine::state::{ClientFlags, Rect};
use crate::engine::{CallbackRegistry, HeadlessWindowSystem, Runtime};
use crate::error::EngineError;

// ============================================================================
// Arguments
// ============================================================================

/// Arguments for `tagtile match`.
#[derive(Args, Debug)]
#[command(after_long_help = r#"Examples:
  tagtile match --name xterm --class XTerm
  tagtile match --name "GNU Image Manipulation Program" --role gimp-image-window
  tagtile match --name Downloads --class Firefox --transient --json"#)]
pub struct MatchArgs {
    /// Window title (WM_NAME).
    #[arg(long, short)]
    pub name: String,

    /// Instance part of WM_CLASS.
    #[arg(long, short)]
    pub instance: Option<String>,

    /// Class part of WM_CLASS.
    #[arg(long)]
    pub class: Option<String>,

    /// Window role (WM_WINDOW_ROLE).
    #[arg(long, short)]
    pub role: Option<String>,

    /// Window id, for rules that match an exact id.
    #[arg(long, value_parser = parse_window_id)]
    pub id: Option<u64>,

    /// Treat the window as transient for another one.
    #[arg(long, short)]
    pub transient: bool,

    /// Usable area to resolve the gravity against.
    #[arg(long, short, value_name = "WxH+X+Y", default_value_t = FALLBACK_SCREEN)]
    pub area: Rect,

    /// Output in JSON format.
    #[arg(long, short = 'j')]
    pub json: bool,
}

/// Arguments for `tagtile gravity`.
#[derive(Args, Debug)]
#[command(after_long_help = r#"Examples:
  tagtile gravity center
  tagtile gravity left66 --area 1280x782+0+18"#)]
pub struct GravityArgs {
    /// Gravity name as configured.
    pub name: String,

    /// Usable area to resolve against.
    #[arg(long, short, value_name = "WxH+X+Y", default_value_t = FALLBACK_SCREEN)]
    pub area: Rect,

    /// Output in JSON format.
    #[arg(long, short = 'j')]
    pub json: bool,
}

/// Arguments for `tagtile chain`.
#[derive(Args, Debug)]
#[command(after_long_help = r#"Examples:
  tagtile chain W-Return
  tagtile chain C-y Return
  tagtile chain C-y --timeout       # let the ambiguous chain expire"#)]
pub struct ChainArgs {
    /// Chords to feed, written as in configuration (e.g. `W-S-1`).
    #[arg(required = true, value_name = "CHORD")]
    pub chords: Vec<String>,

    /// Expire the partial chain after the last chord.
    #[arg(long, short)]
    pub timeout: bool,

    /// Output in JSON format.
    #[arg(long, short = 'j')]
    pub json: bool,
}

/// Arguments for `tagtile panel`.
#[derive(Args, Debug)]
pub struct PanelArgs {
    /// Screen number (1-based).
    #[arg(long, short, default_value_t = ScreenIndex::default())]
    pub screen: ScreenIndex,

    /// Lay out the bottom panel instead of the top one.
    #[arg(long, short)]
    pub bottom: bool,

    /// Panel width in pixels. Defaults to the screen width.
    #[arg(long, short)]
    pub width: Option<u32>,

    /// Output in JSON format.
    #[arg(long, short = 'j')]
    pub json: bool,
}

// ============================================================================
// match
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchReport {
    tags: Vec<String>,
    views: Vec<String>,
    flags: ClientFlags,
    window_type: WindowType,
    gravity: Option<String>,
    geometry: Option<Rect>,
}

/// Accepts decimal or `0x` prefixed hexadecimal ids.
fn parse_window_id(source: &str) -> Result<u64, String> {
    let parsed = match source.strip_prefix("0x").or_else(|| source.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => source.parse(),
    };
    parsed.map_err(|_| format!("invalid window id '{source}'"))
}

fn attributes(args: &MatchArgs) -> WindowAttributes {
    let mut window = WindowAttributes::new(args.id.unwrap_or_default(), args.name.as_str());
    if let Some(instance) = &args.instance {
        window = window.with_instance(instance.as_str());
    }
    if let Some(class) = &args.class {
        window = window.with_class(class.as_str());
    }
    if let Some(role) = &args.role {
        window = window.with_role(role.as_str());
    }
    window
}

fn match_report(model: &ConfigModel, args: &MatchArgs) -> MatchReport {
    let placement = place(model, &attributes(args), args.transient);

    let first_view = placement.views.first().copied();
    let gravity = first_view
        .and_then(|view| placement.gravity_on(model, view))
        .or(model.options().default_gravity);
    let geometry = first_view.map(|view| {
        if placement.flags.full {
            return args.area;
        }
        placement.geometry_on(model, view).unwrap_or_else(|| {
            apply_gravity(gravity.map(|id| model.gravity(id)), args.area, None, model.default_gravity())
        })
    });

    MatchReport {
        tags: placement.tags.iter().map(|id| model.tag(*id).name().to_string()).collect(),
        views: placement.views.iter().map(|id| model.view(*id).name().to_string()).collect(),
        flags: placement.flags,
        window_type: placement.window_type,
        gravity: gravity.map(|id| model.gravity(id).name().to_string()),
        geometry,
    }
}

/// Execute `tagtile match`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn execute_match(args: &MatchArgs) -> Result<(), EngineError> {
    let loaded = super::load_model()?;
    let report = match_report(&loaded.model, args);

    if args.json {
        return output::print_json(&report);
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Property")]
        property: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let join = |names: &[String]| {
        if names.is_empty() { output::format_option::<&str>(None) } else { names.join(", ") }
    };
    let rows = [
        Row { property: "Tags", value: join(&report.tags) },
        Row { property: "Views", value: join(&report.views) },
        Row { property: "Type", value: window_type_name(report.window_type).to_string() },
        Row { property: "Floating", value: output::format_bool(report.flags.floating) },
        Row { property: "Full", value: output::format_bool(report.flags.full) },
        Row { property: "Sticky", value: output::format_bool(report.flags.sticky) },
        Row { property: "Urgent", value: output::format_bool(report.flags.urgent) },
        Row { property: "Resize", value: output::format_bool(report.flags.resize) },
        Row { property: "Gravity", value: output::format_option(report.gravity.as_deref()) },
        Row { property: "Geometry", value: output::format_option(report.geometry) },
    ];

    println!("{}", output::table(rows));
    Ok(())
}

const fn window_type_name(window_type: WindowType) -> &'static str {
    match window_type {
        WindowType::Normal => "normal",
        WindowType::Desktop => "desktop",
        WindowType::Dock => "dock",
        WindowType::Toolbar => "toolbar",
        WindowType::Splash => "splash",
        WindowType::Dialog => "dialog",
    }
}

// ============================================================================
// gravity
// ============================================================================

#[derive(Debug, Serialize)]
struct GravityReport {
    name: String,
    percent: [u8; 4],
    area: Rect,
    geometry: Rect,
}

fn gravity_report(model: &ConfigModel, args: &GravityArgs) -> Result<GravityReport, EngineError> {
    let gravity = model.gravity_by_name(&args.name).ok_or_else(|| {
        EngineError::InvalidArguments(format!("unknown gravity '{}'", args.name))
    })?;

    Ok(GravityReport {
        name: gravity.name().to_string(),
        percent: gravity.percentages(),
        area: args.area,
        geometry: resolve(gravity, args.area),
    })
}

/// Execute `tagtile gravity`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the gravity is
/// unknown.
pub fn execute_gravity(args: &GravityArgs) -> Result<(), EngineError> {
    let loaded = super::load_model()?;
    let report = gravity_report(&loaded.model, args)?;

    if args.json {
        return output::print_json(&report);
    }

    let [x, y, w, h] = report.percent;
    println!("{} ({x}% {y}% {w}% {h}%) in {}", report.name, report.area);
    println!("{}", report.geometry);
    Ok(())
}

// ============================================================================
// chain
// ============================================================================

#[derive(Debug, Serialize)]
struct FiredGrab {
    chain: String,
    kind: &'static str,
    action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChainReport {
    fired: Vec<FiredGrab>,
    state: ChainState,
    keychain: String,
}

fn describe_action(model: &ConfigModel, action: &GrabAction) -> String {
    match action {
        GrabAction::Symbolic(action) => action.to_string(),
        GrabAction::Exec(command) => command.clone(),
        GrabAction::GravityCycle(gravities) => gravities
            .iter()
            .map(|id| model.gravity(*id).name())
            .collect::<Vec<_>>()
            .join(", "),
        GrabAction::Callback(handle) => handle.name().to_string(),
    }
}

fn fired_grab(model: &ConfigModel, id: GrabId) -> FiredGrab {
    let grab = model.grab(id);
    FiredGrab {
        chain: format_chain(grab.chain()),
        kind: grab.action().kind(),
        action: describe_action(model, grab.action()),
    }
}

fn chain_report(model: &ConfigModel, args: &ChainArgs) -> Result<ChainReport, EngineError> {
    let chords = parse_chain(&args.chords.join(" "))
        .map_err(|err| EngineError::InvalidArguments(err.to_string()))?;

    let mut machine = ChainMachine::new(model.options().chain_timeout);
    let now = Instant::now();
    let mut fired = Vec::new();

    for chord in &chords {
        let step = machine.feed(model.chains(), chord, now);
        fired.extend(step.fired.into_iter().map(|id| fired_grab(model, id)));
    }
    if args.timeout {
        fired.extend(machine.force_timeout().map(|id| fired_grab(model, id)));
    }

    Ok(ChainReport { fired, state: machine.state(), keychain: machine.keychain() })
}

/// Execute `tagtile chain`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or a chord is
/// malformed.
pub fn execute_chain(args: &ChainArgs) -> Result<(), EngineError> {
    let loaded = super::load_model()?;
    let report = chain_report(&loaded.model, args)?;

    if args.json {
        return output::print_json(&report);
    }

    #[derive(Tabled)]
    struct Row<'a> {
        #[tabled(rename = "Chain")]
        chain: &'a str,
        #[tabled(rename = "Kind")]
        kind: &'static str,
        #[tabled(rename = "Action")]
        action: &'a str,
    }

    output::heading("Fired", report.fired.len());
    if !report.fired.is_empty() {
        let rows = report.fired.iter().map(|grab| Row {
            chain: &grab.chain,
            kind: grab.kind,
            action: &grab.action,
        });
        println!("{}", output::table(rows));
    }

    let keychain = (!report.keychain.is_empty()).then_some(report.keychain.as_str());
    println!("State: {:?}", report.state);
    println!("Keychain: {}", output::format_option(keychain));
    Ok(())
}

// ============================================================================
// panel
// ============================================================================

/// Screens laid out side by side, up to and including `screen`.
fn side_by_side(screen: usize) -> Vec<Rect> {
    (0..=screen)
        .map(|index| {
            let offset = i32::try_from(index).unwrap_or(i32::MAX / FALLBACK_SCREEN.width);
            FALLBACK_SCREEN.offset(offset * FALLBACK_SCREEN.width, 0)
        })
        .collect()
}

fn panel_layout(model: Arc<ConfigModel>, args: &PanelArgs) -> PanelLayout {
    let screen = args.screen.as_zero_based();
    let mut runtime =
        Runtime::new(model, CallbackRegistry::new(), Box::new(HeadlessWindowSystem));
    runtime.set_screens(&side_by_side(screen));
    runtime.panel(screen, args.bottom, args.width)
}

fn cell_label(model: &ConfigModel, cell: &PanelCell) -> String {
    match cell {
        PanelCell::ViewButton(view) => format!("view {}", model.view(*view).name()),
        PanelCell::Title => "title".to_string(),
        PanelCell::Tray => "tray".to_string(),
        PanelCell::Keychain => "keychain".to_string(),
        PanelCell::Sublet(name) => format!("sublet {name}"),
        PanelCell::Separator => "separator".to_string(),
        PanelCell::Spacer => "spacer".to_string(),
    }
}

/// Execute `tagtile panel`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn execute_panel(args: &PanelArgs) -> Result<(), EngineError> {
    let loaded = super::load_model()?;
    let layout = panel_layout(Arc::clone(&loaded.model), args);

    if args.json {
        return output::print_json(&layout);
    }

    if layout.hidden {
        println!("Panel is hidden on screen {}.", args.screen);
        return Ok(());
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Cell")]
        cell: String,
        #[tabled(rename = "X")]
        x: u32,
        #[tabled(rename = "Width")]
        width: u32,
    }

    output::heading(&format!("Panel {}x{}", layout.width, layout.height), layout.placements.len());
    let rows = layout.placements.iter().map(|placement| Row {
        cell: cell_label(&loaded.model, &placement.cell),
        x: placement.x,
        width: placement.width,
    });
    println!("{}", output::table(rows));
    Ok(())
}

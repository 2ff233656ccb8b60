//! Compiles a [`ConfigDocument`] into a [`ConfigModel`].
//!
//! # Build order
//!
//! 1. Options and gravities (built-ins of the profile first, document
//!    entries replace built-ins with the same name)
//! 2. Tags, plus the implicit `default` tag when the document lacks one
//! 3. Views, plus an implicit `default` view when the document has none
//! 4. Default tag and default view
//! 5. Grabs and the chain prefix tree
//! 6. Sublets, screens, hooks
//!
//! Nothing here fails. Problems become [`ConfigIssue`]s and the offending
//! rule is skipped, so a model is always produced.

use std::collections::{HashMap, HashSet};

use regex::RegexBuilder;

use super::defaults::{
    DEFAULT_TAG_NAME, DEFAULT_VIEW_NAME, ProfileDefaults, builtin_gravities, default_top_panel,
};
use super::document::{
    Blocks, ConfigDocument, GrabActionDoc, GrabBlock, MatchDoc, MatchRuleDoc, NamedBlock, TagBlock,
    ViewBlock,
};
use super::issues::ConfigIssue;
use crate::engine::chain::ChainTrie;
use crate::engine::hooks::{CallbackHandle, HookEvent, HookTable};
use crate::engine::model::{
    AttributeKind, ConfigModel, Grab, GrabAction, GrabId, Gravity, GravityId, MatchRule, Options,
    Padding, PanelEntry, PanelItem, Pattern, ScreenPanels, Sublet, SymbolicAction, Tag, TagId,
    TagProperties, View, ViewId, parse_chain,
};
use crate::engine::state::Rect;

/// A compiled model and the diagnostics collected while building it.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub model: ConfigModel,
    pub issues: Vec<ConfigIssue>,
}

/// Builds models from documents.
#[derive(Debug)]
pub struct ModelBuilder<'a> {
    document: &'a ConfigDocument,
    issues: Vec<ConfigIssue>,
    gravities: Vec<Gravity>,
    gravity_names: HashMap<String, GravityId>,
    tags: Vec<Tag>,
    views: Vec<View>,
}

impl<'a> ModelBuilder<'a> {
    #[must_use]
    pub fn new(document: &'a ConfigDocument) -> Self {
        Self {
            document,
            issues: Vec::new(),
            gravities: Vec::new(),
            gravity_names: HashMap::new(),
            tags: Vec::new(),
            views: Vec::new(),
        }
    }

    /// Compiles the document.
    #[must_use]
    pub fn build(mut self) -> BuildOutput {
        self.build_gravities();
        let options = self.build_options();
        self.build_tags();
        self.build_views();
        let default_tag = self.resolve_default_tag();
        let default_view = self.resolve_default_view(default_tag);
        let (grabs, chains) = self.build_grabs();
        let sublets = self.build_sublets();
        let screens = self.build_screens(&sublets);
        let hooks = self.build_hooks();

        for issue in &self.issues {
            tracing::warn!(kind = issue.kind(), "{issue}");
        }

        tracing::debug!(
            tags = self.tags.len(),
            views = self.views.len(),
            gravities = self.gravities.len(),
            grabs = grabs.len(),
            issues = self.issues.len(),
            "built configuration model"
        );

        let model = ConfigModel {
            tags: self.tags,
            views: self.views,
            gravities: self.gravities,
            gravity_names: self.gravity_names,
            grabs,
            chains,
            screens,
            sublets,
            styles: self.document.styles.clone(),
            hooks,
            options,
            default_tag,
            default_view,
        };

        BuildOutput { model, issues: self.issues }
    }

    fn issue(&mut self, issue: ConfigIssue) { self.issues.push(issue); }

    /// Parses a block collection, reporting malformed table entries.
    fn entries<T: NamedBlock + Clone>(&mut self, kind: &'static str, blocks: &Blocks<T>) -> Vec<T> {
        let mut parsed = Vec::new();
        for entry in blocks.entries() {
            match entry {
                Ok(block) => parsed.push(block),
                Err(err) => self.issue(ConfigIssue::InvalidEntry {
                    kind,
                    name: err.name,
                    message: err.error.to_string(),
                }),
            }
        }
        parsed
    }

    // ========================================================================
    // Options and gravities
    // ========================================================================

    fn build_gravities(&mut self) {
        for (name, percentages) in builtin_gravities(self.document.defaults) {
            self.define_gravity(name, percentages);
        }

        let document = self.document;
        let mut seen = HashSet::new();
        for block in self.entries("gravity", &document.gravities) {
            if block.name.is_empty() {
                self.issue(ConfigIssue::EmptyName { kind: "gravity" });
                continue;
            }
            if !seen.insert(block.name.clone()) {
                self.issue(ConfigIssue::DuplicateName { kind: "gravity", name: block.name });
                continue;
            }

            match percentages(block.geometry) {
                Ok(percentages) => self.define_gravity(&block.name, percentages),
                Err(message) => self.issue(ConfigIssue::InvalidGravity { name: block.name, message }),
            }
        }
    }

    /// Adds a gravity or replaces the one with the same name in place.
    fn define_gravity(&mut self, name: &str, percentages: [u8; 4]) {
        if let Some(id) = self.gravity_names.get(name) {
            self.gravities[id.0] = Gravity::new(*id, name, percentages);
            return;
        }

        let id = GravityId(self.gravities.len());
        self.gravities.push(Gravity::new(id, name, percentages));
        self.gravity_names.insert(name.to_string(), id);
    }

    fn build_options(&mut self) -> Options {
        let document = self.document;
        let profile = document.defaults;
        let defaults = ProfileDefaults::of(profile);
        let doc = &document.options;
        let mut options = defaults.options(profile);

        if let Some(step) = doc.step {
            options.step = step;
        }
        if let Some(snap) = doc.snap {
            options.snap = snap;
        }
        if let Some(urgent) = doc.urgent {
            options.urgent = urgent;
        }
        if let Some(resize) = doc.resize {
            options.resize = resize;
        }
        if let Some(font) = &doc.font {
            options.font.clone_from(font);
        }
        if let Some(separator) = &doc.separator {
            options.separator.clone_from(separator);
        }
        if let Some(border) = doc.border {
            options.border = border;
        }
        if let Some(padding) = doc.padding {
            options.padding = Padding::from_array(padding);
        }
        if let Some(height) = doc.panel_height {
            options.panel_height = height;
        }
        if let Some(timeout) = doc.chain_timeout_ms {
            options.chain_timeout = std::time::Duration::from_millis(timeout);
        }

        let gravity = doc.gravity.clone().unwrap_or_else(|| defaults.gravity.to_string());
        options.default_gravity = self.gravity_names.get(&gravity).copied();
        if options.default_gravity.is_none() {
            self.issue(ConfigIssue::UnknownGravity { context: "options.gravity".into(), name: gravity });
        }

        options
    }

    // ========================================================================
    // Tags
    // ========================================================================

    fn build_tags(&mut self) {
        let document = self.document;
        let mut seen = HashSet::new();

        for block in self.entries("tag", &document.tags) {
            if block.name.is_empty() {
                self.issue(ConfigIssue::EmptyName { kind: "tag" });
                continue;
            }
            if !seen.insert(block.name.clone()) {
                self.issue(ConfigIssue::DuplicateName { kind: "tag", name: block.name });
                continue;
            }

            let tag = self.compile_tag(TagId(self.tags.len()), &block);
            self.tags.push(tag);
        }

        if !seen.contains(DEFAULT_TAG_NAME) {
            self.tags.push(Tag::new(TagId(self.tags.len()), DEFAULT_TAG_NAME));
        }
    }

    fn compile_tag(&mut self, id: TagId, block: &TagBlock) -> Tag {
        let mut tag = Tag::new(id, &block.name);
        let context = format!("tag '{}'", block.name);

        if let Some(matches) = &block.matches {
            tag.rules = self.compile_rules(&context, matches);
        }
        if let Some(exclude) = &block.exclude {
            tag.excludes = self.compile_rules(&context, exclude);
        }

        let gravity = block.gravity.as_ref().and_then(|name| {
            let id = self.gravity_names.get(name).copied();
            if id.is_none() {
                self.issue(ConfigIssue::UnknownGravity { context: context.clone(), name: name.clone() });
            }
            id
        });

        let geometry = block.geometry.map(Rect::from_array).filter(|rect| {
            let valid = rect.is_valid();
            if !valid {
                self.issue(ConfigIssue::InvalidGeometry {
                    tag: block.name.clone(),
                    width: rect.width,
                    height: rect.height,
                });
            }
            valid
        });

        tag.properties = TagProperties {
            float: block.float,
            full: block.full,
            stick: block.stick,
            urgent: block.urgent,
            resize: block.resize,
            window_type: block.window_type,
            gravity,
            geometry,
        };

        tag
    }

    /// Compiles every attribute of every rule object into separate rules.
    fn compile_rules(&mut self, context: &str, doc: &MatchDoc) -> Vec<MatchRule> {
        let mut rules = Vec::new();

        for rule in doc.rules() {
            for (attributes, source) in rule_sources(&rule) {
                let pattern = if rule.plain {
                    Ok(Pattern::plain(source))
                } else {
                    Pattern::regex(source)
                };

                match pattern {
                    Ok(pattern) => rules.push(MatchRule::new(attributes.iter().copied(), pattern)),
                    Err(err) => self.issue(ConfigIssue::InvalidRegex {
                        context: context.to_string(),
                        pattern: source.to_string(),
                        message: err.to_string(),
                    }),
                }
            }

            if let Some(id) = rule.id {
                rules.push(MatchRule::new([AttributeKind::WindowId], Pattern::window_id(id)));
            }
        }

        rules
    }

    // ========================================================================
    // Views
    // ========================================================================

    fn build_views(&mut self) {
        let document = self.document;
        let mut seen = HashSet::new();

        for block in self.entries("view", &document.views) {
            if block.name.is_empty() {
                self.issue(ConfigIssue::EmptyName { kind: "view" });
                continue;
            }
            if seen.contains(&block.name) {
                self.issue(ConfigIssue::DuplicateName { kind: "view", name: block.name });
                continue;
            }

            if let Some(view) = self.compile_view(ViewId(self.views.len()), &block) {
                seen.insert(block.name);
                self.views.push(view);
            }
        }

        if self.views.is_empty() {
            let block = ViewBlock {
                name: DEFAULT_VIEW_NAME.to_string(),
                matches: Some(format!("^{DEFAULT_TAG_NAME}$")),
                ..ViewBlock::default()
            };
            if let Some(view) = self.compile_view(ViewId(0), &block) {
                self.views.push(view);
            }
        }
    }

    fn compile_view(&mut self, id: ViewId, block: &ViewBlock) -> Option<View> {
        let source = block
            .matches
            .clone()
            .unwrap_or_else(|| format!("^{}$", regex::escape(&block.name)));

        let pattern = match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(pattern) => pattern,
            Err(err) => {
                self.issue(ConfigIssue::InvalidRegex {
                    context: format!("view '{}'", block.name),
                    pattern: source,
                    message: err.to_string(),
                });
                return None;
            }
        };

        let tags = self.tags.iter().filter(|tag| pattern.is_match(&tag.name)).map(|tag| tag.id).collect();

        Some(View {
            id,
            name: block.name.clone(),
            pattern,
            tags,
            dynamic: block.dynamic,
            icon: block.icon.clone(),
            icon_only: block.icon_only,
        })
    }

    fn resolve_default_tag(&mut self) -> TagId {
        let document = self.document;
        if let Some(name) = &document.options.default_tag {
            if let Some(tag) = self.tags.iter().find(|tag| &tag.name == name) {
                return tag.id;
            }
            self.issue(ConfigIssue::UnknownDefaultTag { name: name.clone() });
        }

        let first_view_tag = self.views.first().and_then(|view| view.tags.first().copied());

        first_view_tag
            .or_else(|| self.tags.iter().find(|tag| tag.name == DEFAULT_TAG_NAME).map(|tag| tag.id))
            .unwrap_or(TagId(0))
    }

    fn resolve_default_view(&self, default_tag: TagId) -> ViewId {
        self.views.iter().find(|view| view.includes(default_tag)).map_or(ViewId(0), |view| view.id)
    }

    // ========================================================================
    // Grabs
    // ========================================================================

    fn build_grabs(&mut self) -> (Vec<Grab>, ChainTrie) {
        let document = self.document;
        let mut grabs: Vec<Grab> = Vec::new();
        let mut chains = ChainTrie::new();

        for block in self.entries("grab", &document.grabs) {
            let chain = match parse_chain(&block.chain) {
                Ok(chain) => chain,
                Err(err) => {
                    self.issue(ConfigIssue::InvalidChain { chain: block.chain, message: err.to_string() });
                    continue;
                }
            };

            let Some(action) = self.compile_action(&block) else {
                continue;
            };

            match chains.lookup(&chain) {
                Some(existing) => {
                    self.issue(ConfigIssue::DuplicateChain { chain: block.chain });
                    grabs[existing.0].action = action;
                }
                None => {
                    let id = GrabId(grabs.len());
                    chains.insert(&chain, id);
                    grabs.push(Grab { id, chain, action });
                }
            }
        }

        (grabs, chains)
    }

    fn compile_action(&mut self, block: &GrabBlock) -> Option<GrabAction> {
        match &block.action {
            GrabActionDoc::Command(command) => Some(command.parse::<SymbolicAction>().map_or_else(
                |_| GrabAction::Exec(command.clone()),
                GrabAction::Symbolic,
            )),
            GrabActionDoc::Action { action } => match action.parse() {
                Ok(symbolic) => Some(GrabAction::Symbolic(symbolic)),
                Err(_) => {
                    self.issue(ConfigIssue::UnknownAction {
                        chain: block.chain.clone(),
                        action: action.clone(),
                    });
                    None
                }
            },
            GrabActionDoc::Exec { exec } => Some(GrabAction::Exec(exec.clone())),
            GrabActionDoc::Cycle(names) | GrabActionDoc::Gravities { gravities: names } => {
                self.compile_cycle(&block.chain, names)
            }
            GrabActionDoc::Callback { callback } => {
                Some(GrabAction::Callback(CallbackHandle::new(callback.clone())))
            }
        }
    }

    fn compile_cycle(&mut self, chain: &str, names: &[String]) -> Option<GrabAction> {
        let mut cycle = Vec::with_capacity(names.len());

        for name in names {
            match self.gravity_names.get(name) {
                Some(id) => cycle.push(*id),
                None => self.issue(ConfigIssue::UnknownGravity {
                    context: format!("grab '{chain}'"),
                    name: name.clone(),
                }),
            }
        }

        if cycle.is_empty() {
            self.issue(ConfigIssue::EmptyGravityCycle { chain: chain.to_string() });
            return None;
        }

        Some(GrabAction::GravityCycle(cycle))
    }

    // ========================================================================
    // Sublets, screens, hooks
    // ========================================================================

    fn build_sublets(&mut self) -> Vec<Sublet> {
        let document = self.document;
        let mut seen = HashSet::new();
        let mut sublets = Vec::new();

        for block in self.entries("sublet", &document.sublets) {
            if block.name.is_empty() {
                self.issue(ConfigIssue::EmptyName { kind: "sublet" });
                continue;
            }
            if !seen.insert(block.name.clone()) {
                self.issue(ConfigIssue::DuplicateName { kind: "sublet", name: block.name });
                continue;
            }
            sublets.push(Sublet { name: block.name, interval: block.interval, properties: block.properties });
        }

        sublets
    }

    fn build_screens(&mut self, sublets: &[Sublet]) -> Vec<ScreenPanels> {
        let document = self.document;
        let Some(screens) = &document.screens else {
            let top = default_top_panel(document.defaults);
            return vec![ScreenPanels {
                top: self.compile_panel(0, top.iter().copied(), sublets),
                bottom: Vec::new(),
            }];
        };

        screens
            .iter()
            .enumerate()
            .map(|(index, screen)| ScreenPanels {
                top: self.compile_panel(index, screen.top.iter().map(String::as_str), sublets),
                bottom: self.compile_panel(index, screen.bottom.iter().map(String::as_str), sublets),
            })
            .collect()
    }

    /// Compiles one panel list, folding `center` toggles into a group.
    fn compile_panel<'s>(
        &mut self,
        screen: usize,
        items: impl Iterator<Item = &'s str>,
        sublets: &[Sublet],
    ) -> Vec<PanelEntry> {
        let mut entries = Vec::new();
        let mut group: Option<Vec<PanelItem>> = None;
        let mut centered = false;

        for name in items {
            if name == "center" {
                if let Some(items) = group.take() {
                    entries.push(PanelEntry::Center(items));
                } else if centered {
                    self.issue(ConfigIssue::ExtraCenter { screen });
                } else {
                    group = Some(Vec::new());
                    centered = true;
                }
                continue;
            }

            let Some(item) = panel_item(name, sublets) else {
                self.issue(ConfigIssue::UnknownPanelItem { screen, item: name.to_string() });
                continue;
            };

            match group.as_mut() {
                Some(items) => items.push(item),
                None => entries.push(PanelEntry::Item(item)),
            }
        }

        if let Some(items) = group {
            entries.push(PanelEntry::Center(items));
        }

        entries
    }

    fn build_hooks(&mut self) -> HookTable {
        let document = self.document;
        let mut hooks = HookTable::new();

        for (event, targets) in &document.hooks {
            let Ok(parsed) = event.parse::<HookEvent>() else {
                self.issue(ConfigIssue::UnknownHookEvent { event: event.clone() });
                continue;
            };

            for name in targets.names() {
                hooks.push(parsed, CallbackHandle::new(name));
            }
        }

        hooks
    }
}

/// Converts written percentages, rejecting values above 100.
fn percentages(geometry: [u32; 4]) -> Result<[u8; 4], String> {
    let mut out = [0u8; 4];
    for (slot, value) in out.iter_mut().zip(geometry) {
        *slot = u8::try_from(value)
            .ok()
            .filter(|value| *value <= 100)
            .ok_or_else(|| format!("percentages must be within 0..=100, got {geometry:?}"))?;
    }
    Ok(out)
}

/// Returns the (attributes, pattern) pairs of a rule object.
fn rule_sources(rule: &MatchRuleDoc) -> Vec<(&'static [AttributeKind], &str)> {
    let sources: [(&'static [AttributeKind], Option<&str>); 5] = [
        (&AttributeKind::DEFAULT, rule.regex.as_deref()),
        (&[AttributeKind::Name], rule.name.as_deref()),
        (&[AttributeKind::Instance], rule.instance.as_deref()),
        (&[AttributeKind::Class], rule.class.as_deref()),
        (&[AttributeKind::Role], rule.role.as_deref()),
    ];

    sources
        .into_iter()
        .filter_map(|(attributes, source)| source.map(|source| (attributes, source)))
        .collect()
}

/// Resolves a panel item name: fixed items, `sublet:<name>` or a sublet name.
fn panel_item(name: &str, sublets: &[Sublet]) -> Option<PanelItem> {
    if let Ok(item) = name.parse() {
        return Some(item);
    }

    let sublet = name.strip_prefix("sublet:").unwrap_or(name);
    sublets.iter().any(|s| s.name == sublet).then(|| PanelItem::Sublet(sublet.to_string()))
}

/// Builds a model from a document.
#[must_use]
pub fn build(document: &ConfigDocument) -> BuildOutput { ModelBuilder::new(document).build() }

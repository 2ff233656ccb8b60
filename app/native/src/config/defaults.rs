//! Built-in defaults per profile.
//!
//! Two stock configurations exist side by side. `current` is the block-style
//! one (transient windows stay calm, thirds are 34% tall, the GIMP gravities
//! are built in). `legacy` is the flat-table one (transient windows are
//! urgent, thirds are 33%, a smaller fixed font).

use std::time::Duration;

use crate::engine::model::{DefaultsProfile, Options, Padding};

/// Default option values of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub step: u32,
    pub snap: u32,
    pub gravity: &'static str,
    pub urgent: bool,
    pub resize: bool,
    pub font: &'static str,
    pub separator: &'static str,
    pub border: u32,
    pub padding: [i32; 4],
    pub panel_height: u32,
    pub chain_timeout_ms: u64,
}

impl ProfileDefaults {
    /// Returns the defaults of a profile.
    #[must_use]
    pub const fn of(profile: DefaultsProfile) -> Self {
        match profile {
            DefaultsProfile::Current => Self {
                step: 5,
                snap: 10,
                gravity: "center",
                urgent: false,
                resize: false,
                font: "-*-*-medium-*-*-*-14-*-*-*-*-*-*-*",
                separator: "|",
                border: 2,
                padding: [0, 0, 0, 0],
                panel_height: 18,
                chain_timeout_ms: 1000,
            },
            DefaultsProfile::Legacy => Self {
                step: 5,
                snap: 10,
                gravity: "center",
                urgent: true,
                resize: false,
                font: "-*-fixed-*-*-*-*-10-*-*-*-*-*-*-*",
                separator: "|",
                border: 2,
                padding: [0, 0, 0, 0],
                panel_height: 18,
                chain_timeout_ms: 1000,
            },
        }
    }

    /// Options with every value at its default and no default gravity resolved.
    #[must_use]
    pub fn options(&self, profile: DefaultsProfile) -> Options {
        Options {
            step: self.step,
            snap: self.snap,
            default_gravity: None,
            urgent: self.urgent,
            resize: self.resize,
            font: self.font.to_string(),
            separator: self.separator.to_string(),
            border: self.border,
            padding: Padding::from_array(self.padding),
            panel_height: self.panel_height,
            chain_timeout: Duration::from_millis(self.chain_timeout_ms),
            profile,
        }
    }
}

/// Returns the built-in gravities of a profile, in table order.
#[must_use]
pub fn builtin_gravities(profile: DefaultsProfile) -> Vec<(&'static str, [u8; 4])> {
    let third = match profile {
        DefaultsProfile::Current => 34,
        DefaultsProfile::Legacy => 33,
    };

    let mut gravities = vec![
        ("top_left", [0, 0, 50, 50]),
        ("top_left66", [0, 0, 50, 66]),
        ("top_left33", [0, 0, 50, third]),
        ("top", [0, 0, 100, 50]),
        ("top66", [0, 0, 100, 66]),
        ("top33", [0, 0, 100, third]),
        ("top_right", [100, 0, 50, 50]),
        ("top_right66", [100, 0, 50, 66]),
        ("top_right33", [100, 0, 50, third]),
        ("left", [0, 0, 50, 100]),
        ("left66", [0, 50, 50, third]),
        ("left33", [0, 50, 25, third]),
        ("center", [0, 0, 100, 100]),
        ("center66", [0, 50, 100, third]),
        ("center33", [50, 50, 50, third]),
        ("right", [100, 0, 50, 100]),
        ("right66", [100, 50, 50, third]),
        ("right33", [100, 50, 25, third]),
        ("bottom_left", [0, 100, 50, 50]),
        ("bottom_left66", [0, 100, 50, 66]),
        ("bottom_left33", [0, 100, 50, third]),
        ("bottom", [0, 100, 100, 50]),
        ("bottom66", [0, 100, 100, 66]),
        ("bottom33", [0, 100, 100, third]),
        ("bottom_right", [100, 100, 50, 50]),
        ("bottom_right66", [100, 100, 50, 66]),
        ("bottom_right33", [100, 100, 50, third]),
    ];

    if profile == DefaultsProfile::Current {
        gravities.extend([
            ("gimp_image", [50, 50, 80, 100]),
            ("gimp_toolbox", [0, 0, 10, 100]),
            ("gimp_dock", [100, 0, 10, 100]),
        ]);
    }

    gravities
}

/// Returns the top panel of the first screen when no screens are configured.
#[must_use]
pub const fn default_top_panel(profile: DefaultsProfile) -> &'static [&'static str] {
    match profile {
        DefaultsProfile::Current => {
            &["views", "title", "spacer", "keychain", "spacer", "tray", "sublets"]
        }
        DefaultsProfile::Legacy => &["views", "title", "spacer", "tray", "sublets"],
    }
}

/// Name of the tag the builder adds when the document does not declare it.
pub const DEFAULT_TAG_NAME: &str = "default";

/// Name of the view the builder adds when the document declares none.
pub const DEFAULT_VIEW_NAME: &str = "default";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_differ_in_urgency_and_font() {
        let current = ProfileDefaults::of(DefaultsProfile::Current);
        let legacy = ProfileDefaults::of(DefaultsProfile::Legacy);
        assert!(!current.urgent);
        assert!(legacy.urgent);
        assert_ne!(current.font, legacy.font);
    }

    #[test]
    fn test_thirds_follow_profile() {
        let find = |profile, name| {
            builtin_gravities(profile).into_iter().find(|(n, _)| *n == name).map(|(_, g)| g)
        };
        assert_eq!(find(DefaultsProfile::Current, "top33"), Some([0, 0, 100, 34]));
        assert_eq!(find(DefaultsProfile::Legacy, "top33"), Some([0, 0, 100, 33]));
        assert_eq!(find(DefaultsProfile::Legacy, "gimp_image"), None);
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let gravities = builtin_gravities(DefaultsProfile::Current);
        let mut names: Vec<&str> = gravities.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), gravities.len());
    }

    #[test]
    fn test_options_use_profile_values() {
        let options = ProfileDefaults::of(DefaultsProfile::Legacy).options(DefaultsProfile::Legacy);
        assert_eq!(options.chain_timeout, Duration::from_millis(1000));
        assert_eq!(options.profile, DefaultsProfile::Legacy);
        assert!(options.urgent);
    }
}

//! Compiler switch panel
//!
//! Tracks which compiler switches are checked in a widget's settings bar.
//! Default switches are always on and are not sent with a job; switches in
//! an exclusive group uncheck each other.

use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;

use crate::protocol::Switches;

/// One selectable switch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwitchInfo {
    pub name: String,
    #[serde(default)]
    pub help: String,
}

/// Switches a widget can offer
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchCatalog {
    #[serde(default)]
    pub defaults: Vec<String>,
    #[serde(default)]
    pub exclusive: Vec<Vec<String>>,
    #[serde(rename = "switch", default)]
    pub switches: Vec<SwitchInfo>,
}

impl SwitchCatalog {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let catalog: SwitchCatalog =
            toml::from_str(content).context("Invalid compiler switch catalog")?;

        for group in &catalog.exclusive {
            for name in group {
                if catalog.defaults.contains(name) {
                    anyhow::bail!("Default switch {} cannot be in an exclusive group", name);
                }
            }
        }

        Ok(catalog)
    }

    pub fn is_default(&self, name: &str) -> bool {
        self.defaults.iter().any(|d| d == name)
    }

    fn group_of(&self, name: &str) -> Option<&[String]> {
        self.exclusive
            .iter()
            .find(|group| group.iter().any(|s| s == name))
            .map(Vec::as_slice)
    }
}

static BUILTIN_CATALOG: OnceLock<SwitchCatalog> = OnceLock::new();

/// Catalog shipped with the crate
pub fn builtin_catalog() -> anyhow::Result<&'static SwitchCatalog> {
    if let Some(catalog) = BUILTIN_CATALOG.get() {
        return Ok(catalog);
    }
    let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/switches.toml"));
    let catalog = SwitchCatalog::from_toml(content)?;
    Ok(BUILTIN_CATALOG.get_or_init(|| catalog))
}

#[derive(Debug, Clone)]
struct SwitchState {
    info: SwitchInfo,
    checked: bool,
    disabled: bool,
}

/// Checked state of every catalog switch for one widget
#[derive(Debug, Clone)]
pub struct SwitchPanel {
    catalog: SwitchCatalog,
    states: Vec<SwitchState>,
}

impl SwitchPanel {
    /// Panel with the switches of `used` and the defaults checked
    pub fn new(catalog: &SwitchCatalog, used: &Switches) -> Self {
        let mut panel = Self {
            catalog: catalog.clone(),
            states: Vec::new(),
        };
        panel.reset(used);
        panel
    }

    pub fn reset(&mut self, used: &Switches) {
        self.states = self
            .catalog
            .switches
            .iter()
            .map(|info| {
                let is_default = self.catalog.is_default(&info.name);
                SwitchState {
                    checked: is_default || used.compiler.contains(&info.name),
                    disabled: is_default,
                    info: info.clone(),
                }
            })
            .collect();
    }

    /// Change one switch as the user would. Returns false for unknown or
    /// disabled switches, which are left untouched.
    pub fn set(&mut self, name: &str, checked: bool) -> bool {
        let Some(idx) = self.states.iter().position(|s| s.info.name == name) else {
            return false;
        };
        if self.states[idx].disabled {
            return false;
        }

        if let Some(group) = self.catalog.group_of(name) {
            for state in self.states.iter_mut() {
                if group.contains(&state.info.name) {
                    state.checked = false;
                }
            }
        }
        self.states[idx].checked = checked;
        true
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.states
            .iter()
            .any(|s| s.info.name == name && s.checked)
    }

    /// Checked switches that are not defaults, in catalog order
    pub fn active(&self) -> Vec<String> {
        self.states
            .iter()
            .filter(|s| s.checked && !s.disabled)
            .map(|s| s.info.name.clone())
            .collect()
    }

    /// Help text as shown when the help button of a switch is pressed
    pub fn help(&self, name: &str) -> Option<String> {
        self.states
            .iter()
            .find(|s| s.info.name == name)
            .map(|s| format!("{}: {}", s.info.name, s.info.help))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(compiler: &[&str]) -> Switches {
        Switches {
            builder: vec![],
            compiler: compiler.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn panel(compiler: &[&str]) -> SwitchPanel {
        SwitchPanel::new(builtin_catalog().unwrap(), &used(compiler))
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.defaults, vec!["-g", "-O0"]);
        assert_eq!(catalog.exclusive.len(), 2);
    }

    #[test]
    fn test_defaults_checked_but_not_active() {
        let p = panel(&[]);
        assert!(p.is_checked("-g"));
        assert!(p.is_checked("-O0"));
        assert!(p.active().is_empty());
    }

    #[test]
    fn test_used_switches_are_active() {
        let p = panel(&["-gnatwa", "-gnata"]);
        assert_eq!(p.active(), vec!["-gnata", "-gnatwa"]);
    }

    #[test]
    fn test_defaults_cannot_be_changed() {
        let mut p = panel(&[]);
        assert!(!p.set("-g", false));
        assert!(p.is_checked("-g"));
    }

    #[test]
    fn test_exclusive_group_toggles() {
        let mut p = panel(&["-gnato", "-gnatyM50"]);
        assert!(p.set("-gnato11", true));
        assert!(!p.is_checked("-gnato"));
        assert!(p.is_checked("-gnato11"));
        assert!(p.is_checked("-gnatyM50"));

        assert!(p.set("-gnatyM80", true));
        assert!(!p.is_checked("-gnatyM50"));

        // unchecking a member leaves the whole group unchecked
        assert!(p.set("-gnatyM80", false));
        assert!(!p.is_checked("-gnatyM50"));
        assert!(!p.is_checked("-gnatyM80"));
    }

    #[test]
    fn test_unknown_switch_is_ignored() {
        let mut p = panel(&[]);
        assert!(!p.set("-fstack-check", true));
        assert!(p.active().is_empty());
    }

    #[test]
    fn test_reset_restores_used() {
        let mut p = panel(&["-gnata"]);
        p.set("-gnata", false);
        p.set("-gnatp", true);
        p.reset(&used(&["-gnata"]));
        assert_eq!(p.active(), vec!["-gnata"]);
    }

    #[test]
    fn test_help_text() {
        let p = panel(&[]);
        assert_eq!(p.help("-gnatp").as_deref(), Some("-gnatp: Suppress all checks"));
        assert_eq!(p.help("-nope"), None);
    }

    #[test]
    fn test_catalog_rejects_default_in_group() {
        let content = r#"
defaults = ["-g"]
exclusive = [["-g", "-O2"]]
"#;
        assert!(SwitchCatalog::from_toml(content).is_err());
    }
}

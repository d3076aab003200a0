//! Ordered configuration sources.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use super::ConfigCascade;

/// Where a layer of configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    /// Built-in defaults.
    Defaults,
    /// A section of the INI file.
    IniSection(String),
    /// Command-line flags.
    Flags,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::IniSection(section) => write!(f, "[{section}]"),
            Self::Flags => write!(f, "command line"),
        }
    }
}

/// Configuration sources in increasing precedence.
#[derive(Debug, Clone, Default)]
pub struct LayeredConfig {
    layers: Vec<(Layer, ConfigCascade)>,
}

impl LayeredConfig {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// The session stack for `command`: defaults, the INI `[default]`
    /// section, the INI section named after the command, then `flags`.
    ///
    /// A missing file or section is skipped. A malformed file is skipped
    /// with a warning.
    #[must_use]
    pub fn session(config_file: &Path, command: &str, flags: ConfigCascade) -> Self {
        let mut layered = Self::new();
        layered.push(Layer::Defaults, ConfigCascade::defaults());
        layered.push_ini_section(config_file, "default");
        layered.push_ini_section(config_file, command);
        layered.push(Layer::Flags, flags);
        layered
    }

    /// Adds a layer above all previous ones.
    pub fn push(&mut self, origin: Layer, cascade: ConfigCascade) {
        self.layers.push((origin, cascade));
    }

    /// Adds an INI section as a layer, if it can be read.
    pub fn push_ini_section(&mut self, path: &Path, section: &str) {
        match ConfigCascade::from_ini_section(path, section) {
            Ok(Some(cascade)) => self.push(Layer::IniSection(section.to_string()), cascade),
            Ok(None) => debug!(path = %path.display(), section, "no such configuration section"),
            Err(e) => warn!(error = %e, "ignoring configuration file"),
        }
    }

    /// Merges all layers, later ones winning.
    #[must_use]
    pub fn resolve(&self) -> ConfigCascade {
        let mut resolved = ConfigCascade::new();
        for (_, cascade) in &self.layers {
            resolved.merge_with(cascade);
        }
        resolved
    }

    /// The layer that supplies the effective value of `key`.
    #[must_use]
    pub fn origin_of(&self, key: &str) -> Option<&Layer> {
        self.layers
            .iter()
            .rev()
            .find(|(_, cascade)| cascade.contains_key(key))
            .map(|(origin, _)| origin)
    }

    /// Iterates over the layers from lowest to highest precedence.
    pub fn layers(&self) -> impl Iterator<Item = (&Layer, &ConfigCascade)> {
        self.layers.iter().map(|(origin, cascade)| (origin, cascade))
    }
}

//! INI file sections as configuration sources.

use std::io::ErrorKind;
use std::path::Path;

use ini::Ini;

use super::{ConfigCascade, ConfigError};

impl ConfigCascade {
    /// Reads one section of an INI file.
    ///
    /// Returns `Ok(None)` when the file or the section does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Ini`] when the file exists but cannot be read
    /// or parsed.
    pub fn from_ini_section(path: &Path, section: &str) -> Result<Option<Self>, ConfigError> {
        let ini = match Ini::load_from_file(path) {
            Ok(ini) => ini,
            Err(ini::Error::Io(e)) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::Ini {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };

        Ok(ini.section(Some(section)).map(|properties| {
            properties
                .iter()
                .map(|(key, value)| (key.trim(), value.trim()))
                .filter(|(key, _)| !key.is_empty())
                .collect()
        }))
    }
}

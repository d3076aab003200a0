//! Access to the user's environment.
//!
//! Home directory and environment variables are read through the
//! [`Environment`] trait so path defaults can be tested without touching
//! the real process environment.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// File name of the configuration file inside the config home.
pub const CONFIG_FILE_NAME: &str = "latemail.ini";

/// Directory name of the default working directory inside the home.
pub const WORKDIR_NAME: &str = "latemail";

/// Editor used when neither `VISUAL` nor `EDITOR` is set.
pub const FALLBACK_EDITOR: &str = "vi";

/// Source of the home directory and environment variables.
pub trait Environment {
    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Value of an environment variable.
    fn var(&self, key: &str) -> Option<String>;

    /// `$XDG_CONFIG_HOME` when set, non-empty and absolute, else `~/.config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HomeDirectory`] if the fallback is needed and the
    /// home directory is unknown.
    fn config_home(&self) -> Result<PathBuf> {
        if let Some(xdg) = self.var("XDG_CONFIG_HOME") {
            let xdg = PathBuf::from(xdg);
            if xdg.is_absolute() {
                return Ok(xdg);
            }
        }
        Ok(self.home_dir().ok_or(Error::HomeDirectory)?.join(".config"))
    }

    /// `latemail.ini` inside [`Environment::config_home`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::HomeDirectory`] if the config home is unknown.
    fn default_config_file(&self) -> Result<PathBuf> {
        Ok(self.config_home()?.join(CONFIG_FILE_NAME))
    }

    /// `~/latemail`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HomeDirectory`] if the home directory is unknown.
    fn default_workdir(&self) -> Result<PathBuf> {
        Ok(self.home_dir().ok_or(Error::HomeDirectory)?.join(WORKDIR_NAME))
    }

    /// Expands a leading `~` or `~/`. Anything else is returned unchanged, as
    /// is the whole path when the home directory is unknown or not UTF-8.
    fn expand_tilde(&self, path: &str) -> PathBuf {
        let home = || self.home_dir().and_then(|h| h.to_str().map(str::to_owned));
        PathBuf::from(shellexpand::tilde_with_context(path, home).into_owned())
    }

    /// The configured working directory, or the default when it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HomeDirectory`] if the default is needed and the
    /// home directory is unknown.
    fn resolve_workdir(&self, configured: &str) -> Result<PathBuf> {
        if configured.is_empty() {
            self.default_workdir()
        } else {
            Ok(self.expand_tilde(configured))
        }
    }

    /// `$VISUAL`, else `$EDITOR`, else `vi`.
    fn editor(&self) -> String {
        ["VISUAL", "EDITOR"]
            .iter()
            .filter_map(|key| self.var(key))
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeEnvironment {
        home: Option<PathBuf>,
        vars: HashMap<&'static str, &'static str>,
    }

    impl FakeEnvironment {
        fn new(vars: &[(&'static str, &'static str)]) -> Self {
            Self {
                home: Some(PathBuf::from("/home/jo")),
                vars: vars.iter().copied().collect(),
            }
        }
    }

    impl Environment for FakeEnvironment {
        fn home_dir(&self) -> Option<PathBuf> {
            self.home.clone()
        }

        fn var(&self, key: &str) -> Option<String> {
            self.vars.get(key).map(|v| (*v).to_string())
        }
    }

    #[test]
    fn test_config_home_prefers_absolute_xdg() {
        let env = FakeEnvironment::new(&[("XDG_CONFIG_HOME", "/etc/xdg-jo")]);
        assert_eq!(env.config_home().unwrap(), PathBuf::from("/etc/xdg-jo"));
        assert_eq!(
            env.default_config_file().unwrap(),
            PathBuf::from("/etc/xdg-jo/latemail.ini")
        );
    }

    #[test]
    fn test_config_home_ignores_relative_or_empty_xdg() {
        for value in ["", "relative/config"] {
            let env = FakeEnvironment::new(&[("XDG_CONFIG_HOME", value)]);
            assert_eq!(env.config_home().unwrap(), PathBuf::from("/home/jo/.config"));
        }
    }

    #[test]
    fn test_missing_home() {
        let env = FakeEnvironment {
            home: None,
            vars: HashMap::new(),
        };
        assert!(matches!(env.config_home(), Err(Error::HomeDirectory)));
        assert!(matches!(env.resolve_workdir(""), Err(Error::HomeDirectory)));
        assert_eq!(env.expand_tilde("~/mail"), PathBuf::from("~/mail"));
    }

    #[test]
    fn test_expand_tilde() {
        let env = FakeEnvironment::new(&[]);
        assert_eq!(env.expand_tilde("~"), PathBuf::from("/home/jo"));
        assert_eq!(env.expand_tilde("~/mail"), PathBuf::from("/home/jo/mail"));
        assert_eq!(env.expand_tilde("/srv/~/mail"), PathBuf::from("/srv/~/mail"));
        assert_eq!(env.expand_tilde("~other/mail"), PathBuf::from("~other/mail"));
    }

    #[cfg(unix)]
    #[test]
    fn test_expand_tilde_non_utf8_home() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let env = FakeEnvironment {
            home: Some(PathBuf::from(OsStr::from_bytes(b"/home/j\xff"))),
            vars: HashMap::new(),
        };
        assert_eq!(env.expand_tilde("~/mail"), PathBuf::from("~/mail"));
    }

    #[test]
    fn test_resolve_workdir() {
        let env = FakeEnvironment::new(&[]);
        assert_eq!(env.resolve_workdir("").unwrap(), PathBuf::from("/home/jo/latemail"));
        assert_eq!(env.resolve_workdir("~/queue").unwrap(), PathBuf::from("/home/jo/queue"));
    }

    #[test]
    fn test_editor_precedence() {
        let env = FakeEnvironment::new(&[("VISUAL", "code -w"), ("EDITOR", "nano")]);
        assert_eq!(env.editor(), "code -w");

        let env = FakeEnvironment::new(&[("VISUAL", ""), ("EDITOR", "nano")]);
        assert_eq!(env.editor(), "nano");

        let env = FakeEnvironment::new(&[]);
        assert_eq!(env.editor(), "vi");
    }
}

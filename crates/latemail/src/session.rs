//! Session setup shared by all commands.

use std::path::Path;

use anyhow::Context;
use latemail_core::{ConfigCascade, Environment, Folder, LayeredConfig, Workdir, keys};
use tracing::debug;

/// Resolved configuration and working directory of one invocation.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session configuration: defaults, INI sections, then flags.
    pub config: ConfigCascade,
    /// Working directory.
    pub workdir: Workdir,
}

impl Session {
    /// Resolves the session for `command` and makes sure the folders exist.
    ///
    /// `--workdir` wins over the INI file, which wins over `~/latemail`.
    pub fn open(
        env: &impl Environment,
        config_file: Option<&Path>,
        workdir: Option<&str>,
        command: &str,
        mut flags: ConfigCascade,
    ) -> anyhow::Result<Self> {
        let config_file = match config_file {
            Some(path) => path.to_path_buf(),
            None => env.default_config_file()?,
        };

        if let Some(workdir) = workdir {
            flags.set(keys::WORKDIR, workdir);
        }

        let layered = LayeredConfig::session(&config_file, command, flags);
        let mut config = layered.resolve();

        let root = env.resolve_workdir(config.workdir())?;
        debug!(
            config = %config_file.display(),
            workdir = %root.display(),
            origin = %layered
                .origin_of(keys::WORKDIR)
                .map_or_else(|| "home directory".to_string(), ToString::to_string),
            "session resolved"
        );
        config.set(keys::WORKDIR, root.to_string_lossy());

        let workdir = Workdir::new(root);
        workdir
            .ensure_folders()
            .with_context(|| format!("Cannot create folders in {}", workdir.root().display()))?;

        Ok(Self { config, workdir })
    }

    /// Path of a folder in the working directory.
    pub fn folder(&self, folder: Folder) -> std::path::PathBuf {
        self.workdir.folder_path(folder)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    /// Environment with a fixed home directory and variables.
    #[derive(Debug, Default)]
    pub struct FakeEnvironment {
        pub home: Option<PathBuf>,
        pub vars: HashMap<String, String>,
    }

    impl Environment for FakeEnvironment {
        fn home_dir(&self) -> Option<PathBuf> {
            self.home.clone()
        }

        fn var(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }
    }

    /// A session rooted in a fresh temporary directory.
    pub fn temp_session() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let env = FakeEnvironment {
            home: Some(dir.path().to_path_buf()),
            ..FakeEnvironment::default()
        };
        let session = Session::open(&env, None, None, "run", ConfigCascade::new()).unwrap();
        (dir, session)
    }

    #[test]
    fn test_default_workdir_in_home() {
        let (dir, session) = temp_session();
        let root = dir.path().join("latemail");

        assert_eq!(session.workdir.root(), root);
        assert_eq!(session.config.workdir(), root.to_string_lossy());
        assert_eq!(session.config.port().unwrap(), 587);
        for folder in Folder::ALL {
            assert!(session.folder(folder).is_dir());
        }
    }

    #[test]
    fn test_ini_and_flag_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("latemail.ini");
        fs::write(
            &ini,
            "[default]\nworkdir = ~/letters\nserver = mail.example.com\nport = 465\n\n[run]\nport = 2525\n",
        )
        .unwrap();
        let env = FakeEnvironment {
            home: Some(dir.path().to_path_buf()),
            ..FakeEnvironment::default()
        };

        let mut flags = ConfigCascade::new();
        flags.set(keys::SERVER, "relay.example.com");
        let session = Session::open(&env, Some(&ini), None, "run", flags).unwrap();

        assert_eq!(session.workdir.root(), dir.path().join("letters"));
        assert_eq!(session.config.server(), "relay.example.com");
        assert_eq!(session.config.port().unwrap(), 2525);

        let session = Session::open(&env, Some(&ini), None, "next", ConfigCascade::new()).unwrap();
        assert_eq!(session.config.port().unwrap(), 465);
    }

    #[test]
    fn test_workdir_option_wins() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("latemail.ini");
        fs::write(&ini, "[default]\nworkdir = ~/letters\n").unwrap();
        let env = FakeEnvironment {
            home: Some(dir.path().to_path_buf()),
            ..FakeEnvironment::default()
        };

        let session =
            Session::open(&env, Some(&ini), Some("~/other"), "next", ConfigCascade::new()).unwrap();
        assert_eq!(session.workdir.root(), dir.path().join("other"));
        assert!(session.folder(Folder::Todo).is_dir());
    }

    #[test]
    fn test_config_file_under_xdg_config_home() {
        let dir = tempfile::tempdir().unwrap();
        let xdg = dir.path().join("xdg");
        fs::create_dir_all(&xdg).unwrap();
        fs::write(xdg.join("latemail.ini"), "[default]\ndays = 3\n").unwrap();

        let env = FakeEnvironment {
            home: Some(dir.path().to_path_buf()),
            vars: HashMap::from([(
                "XDG_CONFIG_HOME".to_string(),
                xdg.to_string_lossy().into_owned(),
            )]),
        };
        let session = Session::open(&env, None, None, "next", ConfigCascade::new()).unwrap();
        assert_eq!(session.config.days().unwrap(), 3);
    }

    #[test]
    fn test_unknown_home_without_workdir_fails() {
        let env = FakeEnvironment::default();
        assert!(Session::open(&env, None, None, "next", ConfigCascade::new()).is_err());
    }
}

use std::path::PathBuf;

#[cfg(feature = "clap")]
use std::ffi::OsString;

use heck::ToShoutySnakeCase;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::env::{self, EnvOptions};
use crate::error::TagfigError;
use crate::file;
use crate::tree::{BuildOptions, Walk};

type Validator<C> = Box<dyn Fn(&C) -> Result<(), String>>;

/// Entry point for building a tagfig configuration.
pub struct Tagfig;

impl Tagfig {
    pub fn builder<C>() -> TagfigBuilder<C> {
        TagfigBuilder::new()
    }
}

/// Layers sources onto a struct in a fixed order:
///
/// 1. config files, in the order they were added;
/// 2. environment variables;
/// 3. command-line flags, when [`args`](Self::args) was given;
/// 4. validation hooks.
pub struct TagfigBuilder<C> {
    app_name: Option<String>,
    env_prefix: Option<String>,
    env_enabled: bool,
    env_vars: Option<Vec<(String, String)>>,
    files: Vec<PathBuf>,
    strict: bool,
    options: BuildOptions,
    #[cfg(feature = "clap")]
    args: Option<Vec<OsString>>,
    validators: Vec<Validator<C>>,
}

impl<C> TagfigBuilder<C> {
    fn new() -> Self {
        Self {
            app_name: None,
            env_prefix: None,
            env_enabled: true,
            env_vars: None,
            files: Vec::new(),
            strict: true,
            options: BuildOptions::default(),
            #[cfg(feature = "clap")]
            args: None,
            validators: Vec::new(),
        }
    }

    /// Set the application name. It names the flag parser and, unless
    /// [`env_prefix`](Self::env_prefix) is set, becomes the environment
    /// prefix: `my-app` → `MY_APP_PORT`.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the environment variable prefix. An empty prefix reads bare
    /// keys (`PORT`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Read these pairs instead of the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Add a config file (`.toml` or `.json`). Later files override earlier
    /// ones; missing files are skipped.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Options for every tree walk (no-follow and skipped types).
    pub fn build_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse these command-line arguments as the last source. The first item
    /// is the program name, as in `std::env::args_os()`.
    #[cfg(feature = "clap")]
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Run `check` on the loaded value. An `Err` fails the load with
    /// [`TagfigError::Validation`].
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: Fn(&C) -> Result<(), String> + 'static,
    {
        self.validators.push(Box::new(check));
        self
    }

    /// `None` when the environment is disabled.
    fn effective_env_prefix(&self) -> Option<String> {
        if !self.env_enabled {
            return None;
        }
        if let Some(prefix) = &self.env_prefix {
            return Some(prefix.clone());
        }
        Some(
            self.app_name
                .as_deref()
                .map(|app| app.to_shouty_snake_case())
                .unwrap_or_default(),
        )
    }
}

impl<C> TagfigBuilder<C>
where
    C: Walk + Serialize + DeserializeOwned,
{
    /// Apply every configured source to `config`, keeping whatever a source
    /// does not mention.
    pub fn load_into(&self, config: &mut C) -> Result<(), TagfigError> {
        for path in &self.files {
            if !path.exists() {
                log::debug!("file: {} not found, skipping", path.display());
                continue;
            }
            file::load_file(config, path, self.strict)?;
        }

        if let Some(prefix) = self.effective_env_prefix() {
            let opts = EnvOptions {
                prefix: Some(prefix),
                build: self.options.clone(),
            };
            let applied = match &self.env_vars {
                Some(vars) => env::load(config, &opts, vars.iter().cloned())?,
                None => env::load(config, &opts, std::env::vars())?,
            };
            log::debug!("env: {applied} field(s) set");
        }

        #[cfg(feature = "clap")]
        if let Some(args) = &self.args {
            let name = self.app_name.clone().unwrap_or_else(|| "app".to_string());
            crate::flag::parse_from(
                config,
                clap::Command::new(name),
                args.iter().cloned(),
                &self.options,
            )?;
        }

        for check in &self.validators {
            check(config).map_err(TagfigError::Validation)?;
        }
        Ok(())
    }

    /// Start from `C::default()` and apply every source.
    pub fn load(self) -> Result<C, TagfigError>
    where
        C: Default,
    {
        let mut config = C::default();
        self.load_into(&mut config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::fixtures::test::TestConfig;

    fn builder() -> TagfigBuilder<TestConfig> {
        Tagfig::builder::<TestConfig>()
            .app_name("myapp")
            .env_vars(Vec::<(String, String)>::new())
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn app_name_derives_env_prefix() {
        let b = Tagfig::builder::<TestConfig>().app_name("my-app");
        assert_eq!(b.effective_env_prefix(), Some("MY_APP".to_string()));
    }

    #[test]
    fn override_env_prefix() {
        let b = Tagfig::builder::<TestConfig>()
            .app_name("myapp")
            .env_prefix("CUSTOM");
        assert_eq!(b.effective_env_prefix(), Some("CUSTOM".to_string()));
    }

    #[test]
    fn no_env_disables_prefix() {
        let b = Tagfig::builder::<TestConfig>().app_name("myapp").no_env();
        assert_eq!(b.effective_env_prefix(), None);
    }

    #[test]
    fn defaults_only() {
        let cfg = builder().load().unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database.pool_size, 5);
    }

    #[test]
    fn files_merge_in_order() {
        let dir = TempDir::new().unwrap();
        let base = write(&dir, "base.toml", "port = 1000\nhost = \"base\"\n");
        let local = write(&dir, "local.json", r#"{"port": 2000}"#);

        let cfg = builder().file(&base).file(&local).load().unwrap();
        assert_eq!(cfg.port, 2000);
        assert_eq!(cfg.host, "base");
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let cfg = builder()
            .file(dir.path().join("absent.toml"))
            .load()
            .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "localhost");
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.toml", "port = 1000\n");
        let cfg = builder()
            .file(&path)
            .env_vars([("MYAPP_PORT", "2000"), ("PORT", "9")])
            .load()
            .unwrap();
        assert_eq!(cfg.port, 2000);
    }

    #[test]
    fn no_env_ignores_variables() {
        let cfg = builder()
            .env_vars([("MYAPP_PORT", "2000")])
            .no_env()
            .load()
            .unwrap();
        assert_eq!(cfg.port, 8080);
    }

    #[cfg(feature = "clap")]
    #[test]
    fn flags_override_env() {
        let cfg = builder()
            .env_vars([("MYAPP_PORT", "2000"), ("MYAPP_HOST", "env")])
            .args(["myapp", "--port", "3000"])
            .load()
            .unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.host, "env");
    }

    #[test]
    fn strict_file_error_propagates() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.toml", "prot = 1\n");
        let err = builder().file(&path).load().unwrap_err();
        assert!(matches!(err, TagfigError::UnknownKeys(_)));

        let cfg = builder().file(&path).strict(false).load().unwrap();
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn validation_hook_runs_last() {
        let err = builder()
            .env_vars([("MYAPP_DATABASE_POOL_SIZE", "0")])
            .validate(|c: &TestConfig| {
                if c.database.pool_size == 0 {
                    Err("pool_size must be positive".into())
                } else {
                    Ok(())
                }
            })
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("pool_size must be positive"));
    }

    #[test]
    fn load_into_keeps_caller_values() {
        let mut cfg = TestConfig {
            host: "preset".into(),
            ..TestConfig::default()
        };
        builder()
            .env_vars([("MYAPP_PORT", "1")])
            .load_into(&mut cfg)
            .unwrap();
        assert_eq!(cfg.host, "preset");
        assert_eq!(cfg.port, 1);
    }

    #[test]
    fn skipped_types_are_not_loaded() {
        let cfg = builder()
            .env_vars([("MYAPP_DATABASE_POOL_SIZE", "50")])
            .build_options(BuildOptions::default().skip("TestDbConfig"))
            .load()
            .unwrap();
        assert_eq!(cfg.database.pool_size, 5);
    }
}

//! Where the vault and the settings file live.

use std::path::{Path, PathBuf};

use project_sync::Settings;

/// Vault path used when `--vault` is not given
pub const VAULT_ENV: &str = "PROJECT_NOTES_VAULT";

/// Overrides the API key stored in the settings file
pub const TOKEN_ENV: &str = "TODOIST_API_TOKEN";

/// Host configuration resolved from flags, environment and platform dirs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Vault root directory, if known
    pub vault: Option<PathBuf>,
    /// JSON settings file
    pub settings_path: PathBuf,
}

impl Config {
    /// Resolve from command-line flags, falling back to the environment.
    pub fn resolve(vault: Option<PathBuf>, settings: Option<PathBuf>) -> Result<Self, ConfigError> {
        let vault = vault.or_else(|| std::env::var_os(VAULT_ENV).map(PathBuf::from));
        Self::resolve_with(vault, settings, dirs::config_dir(), dirs::home_dir())
    }

    /// Resolution with every external input passed in.
    pub fn resolve_with(
        vault: Option<PathBuf>,
        settings: Option<PathBuf>,
        config_dir: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let settings_path = match settings {
            Some(path) => expand_tilde(&path, home.as_deref()),
            None => config_dir
                .ok_or(ConfigError::NoConfigDir)?
                .join("project-notes")
                .join("settings.json"),
        };

        Ok(Self {
            vault: vault.map(|path| expand_tilde(&path, home.as_deref())),
            settings_path,
        })
    }

    /// The vault root; only the sync commands need it.
    pub fn vault(&self) -> Result<&Path, ConfigError> {
        self.vault.as_deref().ok_or(ConfigError::MissingVault)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    match path.strip_prefix("~") {
        Ok(rest) if rest.as_os_str().is_empty() => home.to_path_buf(),
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Let the environment supply the API key without writing it to disk.
pub fn apply_env_overrides(settings: &mut Settings, token: Option<String>) {
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        settings.api_key = token.trim().to_string();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No vault given: pass --vault or set PROJECT_NOTES_VAULT")]
    MissingVault,

    #[error("Could not determine the configuration directory; pass --settings")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_tilde_only_at_start() {
        let home = Path::new("/home/ana");
        assert_eq!(expand_tilde(Path::new("~"), Some(home)), PathBuf::from("/home/ana"));
        assert_eq!(
            expand_tilde(Path::new("~/Vault"), Some(home)),
            PathBuf::from("/home/ana/Vault")
        );
        assert_eq!(expand_tilde(Path::new("/srv/~x"), Some(home)), PathBuf::from("/srv/~x"));
        assert_eq!(expand_tilde(Path::new("~/Vault"), None), PathBuf::from("~/Vault"));
    }

    #[test]
    fn settings_default_to_config_dir() {
        let config = Config::resolve_with(
            Some(PathBuf::from("~/Vault")),
            None,
            Some(PathBuf::from("/cfg")),
            Some(PathBuf::from("/home/ana")),
        )
        .unwrap();

        assert_eq!(config.settings_path, PathBuf::from("/cfg/project-notes/settings.json"));
        assert_eq!(config.vault().unwrap(), Path::new("/home/ana/Vault"));
    }

    #[test]
    fn missing_vault_is_only_an_error_when_asked_for() {
        let config =
            Config::resolve_with(None, Some(PathBuf::from("/tmp/s.json")), None, None).unwrap();
        assert!(matches!(config.vault(), Err(ConfigError::MissingVault)));
    }

    #[test]
    fn no_config_dir_without_settings_flag() {
        assert!(matches!(
            Config::resolve_with(None, None, None, None),
            Err(ConfigError::NoConfigDir)
        ));
    }

    #[test]
    fn env_token_overrides_blank_or_stored_key() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, Some(" abc ".to_string()));
        assert_eq!(settings.api_key, "abc");

        apply_env_overrides(&mut settings, Some(String::new()));
        assert_eq!(settings.api_key, "abc");
    }
}

use crate::settings::Settings;
use eyre::Result;
use std::{fs, path::PathBuf};

pub const CONFIG_FILENAME: &str = "configuration.json";
const SETTINGS_KEY: &str = "Setting";

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    filepath: PathBuf,
}

impl Config {
    /// Load the configuration from the app data directory, writing the
    /// defaults there on first run.
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join(CONFIG_FILENAME);

        if filepath.exists() {
            return Self::load_from(filepath);
        }

        let config = Self {
            settings: Settings::default(),
            filepath,
        };
        config.save()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn filepath(&self) -> &PathBuf {
        &self.filepath
    }

    /// Create a config with custom settings for testing
    pub fn with_settings(settings: Settings, filepath: PathBuf) -> Self {
        Self { settings, filepath }
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<()> {
        let config_json = serde_json::json!({ SETTINGS_KEY: self.settings });
        let config_str = serde_json::to_string_pretty(&config_json)?;

        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.filepath, config_str)?;
        Ok(())
    }

    /// Load configuration from a custom path.
    ///
    /// A missing file, unparsable JSON or a malformed `Setting` object all
    /// fall back to the defaults. Values are clamped into range.
    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            match serde_json::from_str::<serde_json::Value>(&config_str) {
                Ok(user_config) => {
                    if let Some(user_settings) = user_config.get(SETTINGS_KEY) {
                        match serde_json::from_value::<Settings>(user_settings.clone()) {
                            Ok(parsed) => settings = parsed.clamped(),
                            Err(err) => log::warn!(
                                "ignoring settings in {}: {}",
                                filepath.display(),
                                err
                            ),
                        }
                    }
                }
                Err(err) => log::warn!("{} is not valid JSON: {}", filepath.display(), err),
            }
        }

        Ok(Self { settings, filepath })
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(config_home).join("lectern"));
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join("lectern");
        if path.exists() {
            return Ok(path);
        } else {
            return Ok(PathBuf::from(home).join(".lectern"));
        }
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(".lectern"));
    }

    Err(eyre::eyre!(
        "Could not determine application data directory"
    ))
}

use std::str::FromStr;

use anyhow::Result;

use super::storage::KeyValueStore;

/// Storage key holding the theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => anyhow::bail!("Unknown theme: {}", other),
        }
    }
}

pub struct SettingsService;

impl SettingsService {
    /// Stored theme, or dark when unset, unreadable or unrecognised.
    pub fn load_theme<S: KeyValueStore>(store: &S) -> Theme {
        match store.get(THEME_KEY) {
            Ok(Some(value)) => value.parse().unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("Failed to read theme preference: {}", e);
                Theme::default()
            }
        }
    }

    pub fn save_theme<S: KeyValueStore>(store: &S, theme: Theme) -> Result<()> {
        store.set(THEME_KEY, theme.as_str())
    }

    /// Flip the stored theme and return the new value.
    pub fn toggle_theme<S: KeyValueStore>(store: &S) -> Result<Theme> {
        let theme = Self::load_theme(store).toggled();
        Self::save_theme(store, theme)?;
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStore;

    #[test]
    fn test_theme_defaults_to_dark() {
        let store = MemoryStore::new();
        assert_eq!(SettingsService::load_theme(&store), Theme::Dark);

        store.set(THEME_KEY, "solarized").unwrap();
        assert_eq!(SettingsService::load_theme(&store), Theme::Dark);
    }

    #[test]
    fn test_theme_parses_stored_names() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!(Theme::Dark.as_str().parse::<Theme>().unwrap(), Theme::Dark);
        assert!("Dark".parse::<Theme>().is_err());
    }

    #[test]
    fn test_toggle_persists_plain_string() {
        let store = MemoryStore::new();

        assert_eq!(SettingsService::toggle_theme(&store).unwrap(), Theme::Light);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));

        assert_eq!(SettingsService::toggle_theme(&store).unwrap(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }
}

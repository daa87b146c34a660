//! Viewer configuration: tile service base, basemap credentials and the
//! rendering options copied into every tile descriptor.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tiles::TileUrlResolver;

pub const ENV_PROFILE: &str = "FLOODVIEW_PROFILE";
pub const ENV_TILE_BASE_URL: &str = "FLOODVIEW_TILE_BASE_URL";
pub const ENV_BASEMAP_TOKEN: &str = "FLOODVIEW_BASEMAP_TOKEN";
pub const ENV_BASEMAP_STYLE: &str = "FLOODVIEW_BASEMAP_STYLE";

/// Local proxy path the development server forwards to the tile service.
pub const DEV_TILE_BASE: &str = "/tiles";
pub const DEFAULT_BASEMAP_STYLE: &str = "mapbox/light-v11";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    #[default]
    Development,
    Production,
}

impl FromStr for BuildProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::UnknownProfile(s.to_owned())),
        }
    }
}

/// Credentials for the background map. Only exists when a token is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasemapConfig {
    pub access_token: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub profile: BuildProfile,
    /// Overrides the profile's base. Mandatory for production builds.
    pub tile_base_url: Option<String>,
    pub basemap_token: Option<String>,
    pub basemap_style: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Tile edge length in pixels.
    pub tile_size: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            profile: BuildProfile::Development,
            tile_base_url: None,
            basemap_token: None,
            basemap_style: DEFAULT_BASEMAP_STYLE.to_owned(),
            min_zoom: 0,
            max_zoom: 18,
            tile_size: 256,
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON config; absent keys take their defaults.
    ///
    /// Not validated: the environment may still supply missing pieces, so
    /// validation belongs after the last layer ([`Self::with_env`] or
    /// [`Self::validate`]).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Overlay `FLOODVIEW_*` variables obtained through `lookup`.
    /// Blank values are treated as unset.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(profile) = get(ENV_PROFILE) {
            self.profile = profile.parse()?;
        }
        if let Some(base) = get(ENV_TILE_BASE_URL) {
            self.tile_base_url = Some(base);
        }
        if let Some(token) = get(ENV_BASEMAP_TOKEN) {
            self.basemap_token = Some(token);
        }
        if let Some(style) = get(ENV_BASEMAP_STYLE) {
            self.basemap_style = style;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::ZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if !self.tile_size.is_power_of_two() {
            return Err(ConfigError::TileSize(self.tile_size));
        }
        self.tile_base_url().map(|_| ())
    }

    /// Explicit base if configured, else the dev proxy path. Production has
    /// no implicit fallback.
    pub fn tile_base_url(&self) -> Result<&str, ConfigError> {
        match (&self.tile_base_url, self.profile) {
            (Some(base), _) if !base.trim().is_empty() => Ok(base.trim()),
            (_, BuildProfile::Development) => Ok(DEV_TILE_BASE),
            (_, BuildProfile::Production) => Err(ConfigError::MissingBaseUrl),
        }
    }

    pub fn resolver(&self) -> Result<TileUrlResolver, ConfigError> {
        self.tile_base_url().map(TileUrlResolver::new)
    }

    /// Basemap settings, or `None` when no access token is configured.
    pub fn basemap(&self) -> Option<BasemapConfig> {
        let token = self.basemap_token.as_deref()?.trim();
        if token.is_empty() {
            return None;
        }
        Some(BasemapConfig {
            access_token: token.to_owned(),
            style: self.basemap_style.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn development_defaults_to_proxy_path() {
        let config = ViewerConfig::default();
        assert_eq!(config.tile_base_url().unwrap(), DEV_TILE_BASE);
        assert_eq!(config.resolver().unwrap().base(), "/tiles");
    }

    #[test]
    fn production_requires_explicit_base() {
        let err = ViewerConfig::default()
            .with_env(env(&[(ENV_PROFILE, "production")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseUrl), "got {err:?}");

        let config = ViewerConfig::default()
            .with_env(env(&[
                (ENV_PROFILE, "prod"),
                (ENV_TILE_BASE_URL, "https://tiles.example.org/"),
            ]))
            .unwrap();
        assert_eq!(config.profile, BuildProfile::Production);
        assert_eq!(config.resolver().unwrap().base(), "https://tiles.example.org");
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err = ViewerConfig::default()
            .with_env(env(&[(ENV_PROFILE, "staging")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(ref p) if p == "staging"));
    }

    #[test]
    fn missing_token_disables_basemap_only() {
        let config = ViewerConfig::default().with_env(env(&[])).unwrap();
        assert!(config.basemap().is_none());
        assert!(config.resolver().is_ok());

        let config = ViewerConfig::default()
            .with_env(env(&[(ENV_BASEMAP_TOKEN, "pk.abc"), (ENV_BASEMAP_STYLE, "mapbox/dark-v11")]))
            .unwrap();
        assert_eq!(
            config.basemap(),
            Some(BasemapConfig {
                access_token: "pk.abc".into(),
                style: "mapbox/dark-v11".into(),
            })
        );
    }

    #[test]
    fn blank_env_values_are_unset() {
        let config = ViewerConfig::default()
            .with_env(env(&[(ENV_BASEMAP_TOKEN, "  ")]))
            .unwrap();
        assert!(config.basemap().is_none());
    }

    #[test]
    fn json_config_fills_missing_keys_with_defaults() {
        let config = ViewerConfig::from_json(r#"{"maxZoom": 14, "tileSize": 512}"#).unwrap();
        assert_eq!(config.max_zoom, 14);
        assert_eq!(config.tile_size, 512);
        assert_eq!(config.min_zoom, 0);
        assert_eq!(config.basemap_style, DEFAULT_BASEMAP_STYLE);
    }

    #[test]
    fn invalid_rendering_options_are_rejected() {
        let config = ViewerConfig::from_json(r#"{"minZoom": 10, "maxZoom": 4}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ZoomRange { min: 10, max: 4 }));

        let err = ViewerConfig::from_json(r#"{"tileSize": 300}"#)
            .unwrap()
            .with_env(env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TileSize(300)));
    }

    #[test]
    fn environment_supplies_base_for_production_json() {
        let config = ViewerConfig::from_json(r#"{"profile": "production"}"#)
            .unwrap()
            .with_env(env(&[(ENV_TILE_BASE_URL, "https://tiles.example.org")]))
            .unwrap();
        assert_eq!(config.profile, BuildProfile::Production);
        assert_eq!(config.resolver().unwrap().base(), "https://tiles.example.org");
    }

    #[test]
    fn production_json_without_any_base_fails_after_env() {
        let err = ViewerConfig::from_json(r#"{"profile": "production"}"#)
            .unwrap()
            .with_env(env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseUrl), "got {err:?}");
    }
}

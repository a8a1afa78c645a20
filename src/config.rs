//! Configuration management for the Los Libros reader

use serde::{Deserialize, Serialize};
use std::env;

use crate::pagination::{FrameOptions, ParseScrollAxisError, ScrollAxisMode};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub reader: ReaderConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    pub scroll_direction: ScrollAxisMode,
    pub hide_bars: bool,
    pub should_hide_navigation_on_tap: bool,
    pub enable_tts: bool,
    pub allow_sharing: bool,
    /// Present the reader's own highlight menu; off leaves menus to the host
    pub use_reader_menu_controller: bool,
    pub class_based_on_click_listeners: Vec<ClassBasedOnClickListener>,
}

/// Click listener registered on every element matching a CSS selector.
///
/// A click navigates to `<scheme_name>://<attribute value>/clientX=<x>&clientY=<y>`,
/// which the page routes back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBasedOnClickListener {
    pub scheme_name: String,
    pub query_selector: String,
    pub attribute_name: String,
    pub select_all: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error(transparent)]
    ScrollDirection(#[from] ParseScrollAxisError),
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            scroll_direction: ScrollAxisMode::Vertical,
            hide_bars: false,
            should_hide_navigation_on_tap: true,
            enable_tts: false,
            allow_sharing: true,
            use_reader_menu_controller: true,
            class_based_on_click_listeners: Vec::new(),
        }
    }
}

impl ReaderConfig {
    pub fn frame_options(&self) -> FrameOptions {
        FrameOptions {
            hide_bars: self.hide_bars,
            should_hide_navigation_on_tap: self.should_hide_navigation_on_tap,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reader: ReaderConfig::default(),
            database: DatabaseConfig {
                url: "sqlite:./libros-reader.db".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ReaderConfig::default();

        Ok(Config {
            reader: ReaderConfig {
                scroll_direction: match env::var("READER_SCROLL_DIRECTION") {
                    Ok(value) => value.parse()?,
                    Err(_) => defaults.scroll_direction,
                },
                hide_bars: bool_var("READER_HIDE_BARS", defaults.hide_bars)?,
                should_hide_navigation_on_tap: bool_var(
                    "READER_HIDE_NAVIGATION_ON_TAP",
                    defaults.should_hide_navigation_on_tap,
                )?,
                enable_tts: bool_var("READER_ENABLE_TTS", defaults.enable_tts)?,
                allow_sharing: bool_var("READER_ALLOW_SHARING", defaults.allow_sharing)?,
                use_reader_menu_controller: bool_var(
                    "READER_USE_MENU_CONTROLLER",
                    defaults.use_reader_menu_controller,
                )?,
                class_based_on_click_listeners: defaults.class_based_on_click_listeners,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./libros-reader.db".to_string()),
            },
        })
    }
}

fn bool_var(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

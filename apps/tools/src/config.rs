use std::{fs, path::Path};

use serde::Deserialize;

/// Scripted-session settings for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub participant_names: Vec<String>,
    pub story_texts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            participant_names: vec![
                "alice@example.com".into(),
                "bob".into(),
                "carol".into(),
            ],
            story_texts: vec![
                "Estimate the CSV importer".into(),
                "Estimate the retry queue".into(),
            ],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    participant_names: Option<Vec<String>>,
    story_texts: Option<Vec<String>>,
}

/// Defaults, overridden by the TOML file when present, overridden in turn by
/// `POKER_PARTICIPANTS` / `POKER_STORIES` (comma-separated).
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<SettingsFile>(&raw) {
            if let Some(v) = file_cfg.participant_names {
                settings.participant_names = v;
            }
            if let Some(v) = file_cfg.story_texts {
                settings.story_texts = v;
            }
        }
    }

    if let Ok(v) = std::env::var("POKER_PARTICIPANTS") {
        settings.participant_names = split_list(&v);
    }
    if let Ok(v) = std::env::var("POKER_STORIES") {
        settings.story_texts = split_list(&v);
    }

    settings
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

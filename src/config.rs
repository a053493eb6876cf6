use std::fs;
use std::path::{Path, PathBuf};

use crate::types::GameConfig;
use crate::words::WordBank;

/// Resolves a path relative to the config directory.
fn config_path(sub: &str) -> PathBuf {
    let base = std::env::var("CONFIG_PATH")
        .unwrap_or_else(|_| "config".to_string());
    Path::new(&base).join(sub)
}

/// Initialize config directory with defaults if missing.
pub fn init() -> std::io::Result<()> {
    let base = config_path("");
    if !base.exists() {
        fs::create_dir_all(&base)?;
    }

    let game_path = config_path("game.json");
    if !game_path.exists() {
        let defaults = serde_json::to_string_pretty(&GameConfig::default())?;
        fs::write(&game_path, defaults)?;
    }

    Ok(())
}

/// Load the game configuration, falling back to defaults on any error.
pub fn load_game_config() -> GameConfig {
    let path = config_path("game.json");
    match fs::read_to_string(&path) {
        Ok(data) => parse_game_config(&data).unwrap_or_else(|e| {
            tracing::error!("Failed to parse {}: {}", path.display(), e);
            GameConfig::default()
        }),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}, using defaults", path.display(), e);
            GameConfig::default()
        }
    }
}

fn parse_game_config(data: &str) -> serde_json::Result<GameConfig> {
    serde_json::from_str(data)
}

/// Load the word list. An optional words.json (a JSON array of strings)
/// replaces the built-in list.
pub fn load_words() -> WordBank {
    let path = config_path("words.json");
    if !path.exists() {
        return WordBank::default();
    }

    let words: Vec<String> = match fs::read_to_string(&path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(words) => words,
            Err(e) => {
                tracing::error!("Failed to parse {}: {}", path.display(), e);
                return WordBank::default();
            }
        },
        Err(e) => {
            tracing::error!("Failed to read {}: {}", path.display(), e);
            return WordBank::default();
        }
    };

    let bank = WordBank::new(words);
    if bank.len() < crate::game::WORD_CHOICES {
        tracing::error!(
            "{} has only {} usable words, using the built-in list",
            path.display(),
            bank.len()
        );
        return WordBank::default();
    }

    tracing::info!("Loaded {} words from {}", bank.len(), path.display());
    bank
}

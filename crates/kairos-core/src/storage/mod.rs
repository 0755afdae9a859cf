mod config;
pub mod database;
pub mod journal;
pub mod migrations;

pub use config::{ChatConfig, Config, PomodoroConfig, SchedulerConfig};
pub use database::{Database, LabelFocus, SessionKind, Stats};
pub use journal::SessionJournal;

use std::path::PathBuf;

/// Returns the kairos data directory, creating it if needed.
///
/// `KAIROS_DATA_DIR` wins when set. Otherwise this is `~/.config/kairos/`,
/// or `~/.config/kairos-dev/` with `KAIROS_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("KAIROS_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("KAIROS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("kairos-dev")
            } else {
                base_dir.join("kairos")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

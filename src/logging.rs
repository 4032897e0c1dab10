// File logging; stderr belongs to the terminal UI

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "studymate.log";

/// Route the `log` facade into `<dir>/studymate.log`. `RUST_LOG` sets the filter, default `info`.
pub fn init(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("Logger already initialized")?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_log_file() {
        let temp_dir = TempDir::new().unwrap();
        // A second init in the same process fails, which is fine here
        let _ = init(temp_dir.path());
        assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
    }
}

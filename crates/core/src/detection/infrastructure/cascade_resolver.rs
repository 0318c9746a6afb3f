use std::path::{Path, PathBuf};

use crate::shared::constants::{CASCADE_ENV_VAR, CASCADE_FILE_NAME};
use crate::shared::error::CascadeLoadError;

/// Locate the face cascade asset.
///
/// Resolution order:
/// 1. Explicit path (e.g. from the command line)
/// 2. `PROCTORCAM_CASCADE` environment variable
/// 3. Platform data directory (see [`cascade_data_dir`])
///
/// An explicit or environment path that does not exist is an error rather
/// than a fall-through, so a typo never silently picks up another asset.
pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf, CascadeLoadError> {
    let env = std::env::var_os(CASCADE_ENV_VAR).map(PathBuf::from);
    resolve_with(explicit, env.as_deref(), cascade_data_dir().as_deref())
}

/// [`resolve`] with the environment and data directory injected.
pub fn resolve_with(
    explicit: Option<&Path>,
    env: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<PathBuf, CascadeLoadError> {
    if let Some(path) = explicit {
        return existing(path, "explicit path");
    }

    if let Some(path) = env {
        return existing(path, CASCADE_ENV_VAR);
    }

    if let Some(dir) = data_dir {
        let installed = dir.join(CASCADE_FILE_NAME);
        if installed.is_file() {
            log::info!("Using installed cascade {}", installed.display());
            return Ok(installed);
        }
        return Err(CascadeLoadError::NotFound {
            searched: installed.display().to_string(),
        });
    }

    Err(CascadeLoadError::NotFound {
        searched: format!("no explicit path, {CASCADE_ENV_VAR} unset, no data directory"),
    })
}

/// Platform-specific cascade directory.
///
/// - macOS: `~/Library/Application Support/proctorcam/cascades/`
/// - Linux: `$XDG_DATA_HOME/proctorcam/cascades/` or `~/.local/share/proctorcam/cascades/`
/// - Windows: `%APPDATA%/proctorcam/cascades/`
pub fn cascade_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("proctorcam").join("cascades"))
}

fn existing(path: &Path, source: &str) -> Result<PathBuf, CascadeLoadError> {
    if path.is_file() {
        log::info!("Using cascade {} ({source})", path.display());
        Ok(path.to_path_buf())
    } else {
        Err(CascadeLoadError::NotFound {
            searched: format!("{} ({source})", path.display()),
        })
    }
}

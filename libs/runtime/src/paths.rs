use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("cannot determine the user home directory (HOME/APPDATA is not set)")]
    NoPlatformHome,
    #[error("failed to create home directory '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn platform_home() -> Result<PathBuf, HomeDirError> {
    #[cfg(target_os = "windows")]
    let var = "APPDATA";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";

    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(HomeDirError::NoPlatformHome)
}

/// Expand a leading `~` against the platform home directory.
fn expand_tilde(raw: &str) -> Result<PathBuf, HomeDirError> {
    if raw == "~" {
        return platform_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(platform_home()?.join(rest));
    }
    Ok(PathBuf::from(raw))
}

/// Resolve the server home directory into an absolute path.
///
/// - `None` (or blank) resolves to `<platform home>/<default_subdir>`.
/// - `~` is expanded; relative paths are anchored at the current directory.
/// - With `create = true` the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let mut path = match configured.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => expand_tilde(raw)?,
        _ => platform_home()?.join(default_subdir),
    };

    if path.is_relative() {
        let cwd = std::env::current_dir().map_err(|source| HomeDirError::Create {
            path: path.clone(),
            source,
        })?;
        path = cwd.join(path);
    }

    if create {
        ensure_dir(&path)?;
    }
    Ok(path)
}

fn ensure_dir(path: &Path) -> Result<(), HomeDirError> {
    std::fs::create_dir_all(path).map_err(|source| HomeDirError::Create {
        path: path.to_path_buf(),
        source,
    })
}

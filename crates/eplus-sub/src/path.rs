//! Home-directory and relative path expansion

use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` and make `path` absolute.
///
/// `~` (alone or followed by a separator) is replaced by the user's home
/// directory, relative paths are joined onto the current directory, and
/// `.`/`..` components are folded without touching the filesystem.
/// `None` maps to `None`.
pub fn expand_path(path: Option<&Path>) -> Option<PathBuf> {
    let path = path?;
    let cwd = std::env::current_dir().ok();
    Some(expand_path_with(
        path,
        dirs::home_dir().as_deref(),
        cwd.as_deref(),
    ))
}

/// [`expand_path`] for a path that is known to be present.
pub fn expand(path: impl AsRef<Path>) -> PathBuf {
    // Some in, Some out
    expand_path(Some(path.as_ref())).unwrap_or_else(|| path.as_ref().to_path_buf())
}

/// Expansion with explicit home and working directories.
pub fn expand_path_with(path: &Path, home: Option<&Path>, cwd: Option<&Path>) -> PathBuf {
    let expanded = match (strip_tilde(path), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    };

    let absolute = match cwd {
        Some(cwd) if expanded.is_relative() => cwd.join(expanded),
        _ => expanded,
    };

    normalize(&absolute)
}

fn strip_tilde(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => Some(components.as_path().to_path_buf()),
        _ => None,
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` stays `/`
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

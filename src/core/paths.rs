//! Shared path manipulation utilities.

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute relative to the working directory and resolve `.`/`..`
/// syntactically.
///
/// Symlinks are deliberately left alone: a root that is itself a symlink must
/// stay a symlink so the walker classifies (and skips) it instead of erasing
/// whatever it points at.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty path",
        ));
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    Ok(normalize_syntactic(&absolute))
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

/// Strip `prefix` from the front of `path` once, component-wise.
///
/// Returns `path` unchanged when it does not start with `prefix` or when the
/// remainder would be empty.
pub fn strip_display_prefix(path: &Path, prefix: &Path) -> PathBuf {
    match path.strip_prefix(prefix) {
        Ok(rest) if !rest.as_os_str().is_empty() => rest.to_path_buf(),
        _ => path.to_path_buf(),
    }
}

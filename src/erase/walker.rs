//! Depth-first tree walker feeding the erase pipeline.
//!
//! The walk is iterative: a stack of open directory frames, each holding its
//! entries sorted by name, so output order is lexical pre-order and deep trees
//! cannot overflow the thread stack. Symlinks are never followed and never
//! yielded. Only regular files are yielded; directories are descended into and
//! every other entry kind is skipped.

#![allow(missing_docs)]

use std::fs::{self, DirEntry, FileType};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use crate::core::config::WalkerConfig;
use crate::core::errors::EraseError;
use crate::core::paths::absolutize;

/// A root that exists and has been made absolute.
#[derive(Debug, Clone)]
pub struct ResolvedRoot {
    pub path: PathBuf,
    file_type: FileType,
    device: u64,
}

impl ResolvedRoot {
    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    pub fn is_symlink(&self) -> bool {
        self.file_type.is_symlink()
    }
}

/// Make `raw` absolute and check it exists without following a final symlink.
pub fn resolve_root(raw: &Path) -> Result<ResolvedRoot, EraseError> {
    let path = absolutize(raw).map_err(|source| EraseError::RootResolution {
        path: raw.to_path_buf(),
        source,
    })?;
    let meta = fs::symlink_metadata(&path).map_err(|source| EraseError::RootResolution {
        path: path.clone(),
        source,
    })?;
    Ok(ResolvedRoot {
        device: device_id(&meta),
        file_type: meta.file_type(),
        path,
    })
}

/// Something the walk ran into.
#[derive(Debug)]
pub enum WalkEvent {
    /// A regular file to erase.
    File(PathBuf),
    /// A directory or entry that could not be read; the walk carries on.
    Error(EraseError),
}

struct Frame {
    entries: std::vec::IntoIter<DirEntry>,
}

/// Single-threaded lexical walker.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    config: WalkerConfig,
}

impl TreeWalker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Walk `root`, handing each finding to `visit` in lexical pre-order.
    ///
    /// Stops early and returns `Break` as soon as `visit` does.
    pub fn walk<V>(&self, root: &ResolvedRoot, mut visit: V) -> ControlFlow<()>
    where
        V: FnMut(WalkEvent) -> ControlFlow<()>,
    {
        if root.file_type.is_file() {
            return visit(WalkEvent::File(root.path.clone()));
        }
        if !root.file_type.is_dir() {
            return ControlFlow::Continue(());
        }

        let mut stack = Vec::new();
        if let Some(frame) = open_frame(&root.path, &mut visit)? {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };
            let path = entry.path();

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(source) => {
                    visit(WalkEvent::Error(EraseError::Traversal { path, source }))?;
                    continue;
                }
            };

            if file_type.is_symlink() {
                continue;
            }

            if file_type.is_dir() {
                if self.config.one_file_system && crosses_device(&entry, root.device) {
                    visit(WalkEvent::Error(EraseError::CrossDevice { path }))?;
                    continue;
                }
                if let Some(frame) = open_frame(&path, &mut visit)? {
                    stack.push(frame);
                }
            } else if file_type.is_file() {
                visit(WalkEvent::File(path))?;
            }
        }

        ControlFlow::Continue(())
    }

    /// Collect every event of a walk; convenient for small trees and tests.
    pub fn collect(&self, root: &ResolvedRoot) -> Vec<WalkEvent> {
        let mut out = Vec::new();
        let _ = self.walk(root, |event| {
            out.push(event);
            ControlFlow::Continue(())
        });
        out
    }
}

fn crosses_device(entry: &DirEntry, root_device: u64) -> bool {
    entry
        .metadata()
        .is_ok_and(|meta| device_id(&meta) != root_device)
}

/// Read and sort a directory. Unreadable directories and entries are reported
/// and skipped.
fn open_frame<V>(dir: &Path, visit: &mut V) -> ControlFlow<(), Option<Frame>>
where
    V: FnMut(WalkEvent) -> ControlFlow<()>,
{
    let reader = match fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(source) => {
            visit(WalkEvent::Error(EraseError::Traversal {
                path: dir.to_path_buf(),
                source,
            }))?;
            return ControlFlow::Continue(None);
        }
    };

    let mut entries = Vec::new();
    for entry in reader {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(source) => visit(WalkEvent::Error(EraseError::Traversal {
                path: dir.to_path_buf(),
                source,
            }))?,
        }
    }
    entries.sort_by_key(DirEntry::file_name);

    ControlFlow::Continue(Some(Frame {
        entries: entries.into_iter(),
    }))
}

fn device_id(meta: &fs::Metadata) -> u64 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        meta.dev()
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn files(events: &[WalkEvent]) -> Vec<PathBuf> {
        events
            .iter()
            .filter_map(|e| match e {
                WalkEvent::File(p) => Some(p.clone()),
                WalkEvent::Error(_) => None,
            })
            .collect()
    }

    fn walk(root: &Path) -> Vec<WalkEvent> {
        let resolved = resolve_root(root).unwrap();
        TreeWalker::default().collect(&resolved)
    }

    #[test]
    fn yields_files_in_lexical_pre_order() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("z.txt"), b"z").unwrap();
        fs::write(root.join("b/inner/deep.txt"), b"d").unwrap();
        fs::write(root.join("b/c.txt"), b"c").unwrap();
        fs::write(root.join("a/one.txt"), b"1").unwrap();
        fs::write(root.join("a/two.txt"), b"2").unwrap();

        let found = files(&walk(root));
        assert_eq!(
            found,
            vec![
                root.join("a/one.txt"),
                root.join("a/two.txt"),
                root.join("b/c.txt"),
                root.join("b/inner/deep.txt"),
                root.join("z.txt"),
            ]
        );
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("empty/nested")).unwrap();
        assert!(walk(tmp.path()).is_empty());
    }

    #[test]
    fn file_root_yields_itself() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("only.txt");
        fs::write(&file, b"x").unwrap();
        assert_eq!(files(&walk(&file)), vec![file]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_neither_followed_nor_yielded() {
        let tmp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("victim.txt"), b"keep").unwrap();
        fs::write(tmp.path().join("real.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("dir_link")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("victim.txt"),
            tmp.path().join("file_link"),
        )
        .unwrap();

        assert_eq!(files(&walk(tmp.path())), vec![tmp.path().join("real.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_root_is_not_followed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("victim.txt"), b"keep").unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(tmp.path(), &link).unwrap();

        let resolved = resolve_root(&link).unwrap();
        assert!(resolved.is_symlink());
        assert!(TreeWalker::default().collect(&resolved).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn fifos_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let fifo = tmp.path().join("pipe");
        nix::unistd::mkfifo(&fifo, nix::sys::stat::Mode::S_IRWXU).unwrap();
        fs::write(tmp.path().join("plain.txt"), b"x").unwrap();

        assert_eq!(files(&walk(tmp.path())), vec![tmp.path().join("plain.txt")]);
    }

    #[test]
    fn missing_root_fails_resolution() {
        let err = resolve_root(Path::new("/definitely/does/not/exist")).unwrap_err();
        assert_eq!(err.code(), "ERS-2001");
        assert_eq!(err.path(), Some(Path::new("/definitely/does/not/exist")));
    }

    #[test]
    fn empty_root_fails_resolution() {
        let err = resolve_root(Path::new("")).unwrap_err();
        assert_eq!(err.code(), "ERS-2001");
    }

    #[test]
    fn relative_root_is_made_absolute() {
        let resolved = resolve_root(Path::new(".")).unwrap();
        assert!(resolved.path.is_absolute());
        assert!(resolved.is_dir());
    }

    #[test]
    fn break_stops_the_walk() {
        let tmp = TempDir::new().unwrap();
        for name in ["a", "b", "c", "d"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let resolved = resolve_root(tmp.path()).unwrap();

        let mut seen = 0;
        let flow = TreeWalker::default().walk(&resolved, |_| {
            seen += 1;
            if seen == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(flow.is_break());
        assert_eq!(seen, 2);
    }

    #[test]
    fn vanished_directory_is_reported_and_siblings_continue() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let gone = root.join("b_dir");
        fs::create_dir(&gone).unwrap();
        fs::write(gone.join("c.txt"), b"c").unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("d.txt"), b"d").unwrap();

        // The root listing is already taken when `a.txt` is visited, so
        // `b_dir` is still queued but can no longer be read.
        let resolved = resolve_root(root).unwrap();
        let mut events = Vec::new();
        let flow = TreeWalker::default().walk(&resolved, |event| {
            if matches!(&event, WalkEvent::File(p) if p.ends_with("a.txt")) {
                fs::remove_dir_all(&gone).unwrap();
            }
            events.push(event);
            ControlFlow::Continue(())
        });

        assert!(flow.is_continue());
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            WalkEvent::Error(EraseError::Traversal { path, .. }) if *path == gone
        ));
        assert_eq!(files(&events), vec![root.join("a.txt"), root.join("d.txt")]);
    }
}

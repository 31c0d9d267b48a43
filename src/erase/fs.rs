//! Filesystem seam for the erase pipeline.
//!
//! Everything a worker does to a file goes through [`EraseFs`] and
//! [`EraseTarget`], so tests can count open handles or inject faults without
//! touching the walker, which always reads the real directory tree.

#![allow(missing_docs)]

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Positioned writes: `buf` lands at `offset` regardless of any cursor.
pub trait WriteAt {
    fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()>;
}

/// An open, writable file being erased.
pub trait EraseTarget: WriteAt {
    /// Current length in bytes.
    fn size(&self) -> io::Result<u64>;
    /// Flush written data to storage.
    fn sync(&self) -> io::Result<()>;
    /// Cut the file to zero length.
    fn truncate(&self) -> io::Result<()>;
    /// Release the handle. Consuming `self` makes a second release impossible.
    fn close(self) -> io::Result<()>;
}

/// Opens files for in-place overwrite.
pub trait EraseFs: Send + Sync {
    type Target: EraseTarget;

    /// Open for writing without creating or truncating.
    fn open_for_overwrite(&self, path: &Path) -> io::Result<Self::Target>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl EraseFs for OsFs {
    type Target = OsTarget;

    fn open_for_overwrite(&self, path: &Path) -> io::Result<OsTarget> {
        let mut opts = OpenOptions::new();
        opts.write(true).create(false).truncate(false);
        // A path swapped for a symlink after discovery must not redirect the
        // overwrite to the link target.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt as _;
            opts.custom_flags(nix::fcntl::OFlag::O_NOFOLLOW.bits());
        }
        Ok(OsTarget {
            file: opts.open(path)?,
        })
    }
}

/// A real open file.
#[derive(Debug)]
pub struct OsTarget {
    file: File,
}

impl WriteAt for OsTarget {
    fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()> {
        write_all_at(&self.file, buf, offset)
    }
}

impl EraseTarget for OsTarget {
    fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn sync(&self) -> io::Result<()> {
        self.file.sync_data()
    }

    fn truncate(&self) -> io::Result<()> {
        self.file.set_len(0)
    }

    #[cfg(unix)]
    fn close(self) -> io::Result<()> {
        use std::os::fd::IntoRawFd as _;
        // Dropping a `File` discards close(2) errors; close explicitly so they
        // can be reported.
        nix::unistd::close(self.file.into_raw_fd()).map_err(io::Error::from)
    }

    #[cfg(not(unix))]
    fn close(self) -> io::Result<()> {
        drop(self.file);
        Ok(())
    }
}

impl WriteAt for File {
    fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()> {
        write_all_at(self, buf, offset)
    }
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::write_all_at(file, buf, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt as _;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ));
            }
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

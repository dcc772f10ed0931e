//! Key namespace scanning.
//!
//! Private keys live under a root directory that mirrors each GUN's segments:
//!
//! ```text
//! <root>/docker.io/library/ubuntu/<fingerprint>.key   -> ("docker.io/library/ubuntu", <fingerprint>)
//! <root>/<fingerprint>.key                            -> ("", <fingerprint>)
//! ```
//!
//! The scanner only reads this layout. Decoding a path is a pure function
//! ([`decode_key_path`]) and traversal sits behind [`DirectoryWalker`], so the
//! mapping can be exercised against a virtual listing.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::fingerprint::Fingerprint;

/// Reserved extension of private key files.
pub const KEY_EXTENSION: &str = "key";

/// A (GUN, fingerprint) pair recovered from the key namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyEntry {
    pub gun: String,
    pub fingerprint: Fingerprint,
}

impl KeyEntry {
    /// Key stored directly under the root, with no GUN directory.
    pub fn is_ungrouped(&self) -> bool {
        self.gun.is_empty()
    }
}

/// One entry produced by a directory traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Recursive directory traversal.
pub trait DirectoryWalker {
    /// Every entry below `root`, depth first. Errors are reported per entry and
    /// do not end the traversal.
    fn walk<'a>(&'a self, root: &Path) -> Box<dyn Iterator<Item = io::Result<WalkEntry>> + 'a>;
}

/// Lazy walk over the real filesystem, entries sorted by name within each
/// directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWalker;

impl DirectoryWalker for FsWalker {
    fn walk<'a>(&'a self, root: &Path) -> Box<dyn Iterator<Item = io::Result<WalkEntry>> + 'a> {
        Box::new(FsWalk {
            root: Some(root.to_path_buf()),
            stack: Vec::new(),
        })
    }
}

struct FsWalk {
    root: Option<PathBuf>,
    stack: Vec<std::vec::IntoIter<io::Result<fs::DirEntry>>>,
}

impl FsWalk {
    fn descend(&mut self, dir: &Path) -> io::Result<()> {
        let mut entries: Vec<io::Result<fs::DirEntry>> = fs::read_dir(dir)?.collect();
        entries.sort_by(|a, b| match (a, b) {
            (Ok(a), Ok(b)) => a.file_name().cmp(&b.file_name()),
            (Err(_), Ok(_)) => Ordering::Less,
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Err(_)) => Ordering::Equal,
        });
        self.stack.push(entries.into_iter());
        Ok(())
    }
}

impl Iterator for FsWalk {
    type Item = io::Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            if let Err(e) = self.descend(&root) {
                return Some(Err(e));
            }
        }
        loop {
            let entry = match self.stack.last_mut()?.next() {
                Some(entry) => entry,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            let path = entry.path();
            let is_dir = match entry.file_type() {
                Ok(ft) => ft.is_dir(),
                Err(e) => return Some(Err(e)),
            };
            if is_dir {
                if let Err(e) = self.descend(&path) {
                    return Some(Err(e));
                }
            }
            return Some(Ok(WalkEntry { path, is_dir }));
        }
    }
}

/// Recover the (GUN, fingerprint) pair encoded in a key file path.
///
/// Returns `None` for files without the key extension, paths outside `root`
/// and paths whose segments are not valid UTF-8.
pub fn decode_key_path(root: &Path, path: &Path) -> Option<KeyEntry> {
    if path.extension()? != KEY_EXTENSION {
        return None;
    }
    let relative = path.strip_prefix(root).ok()?;
    let fingerprint = relative.file_stem()?.to_str()?;

    let gun = relative
        .parent()
        .map(|dir| {
            dir.components()
                .map(|c| match c {
                    Component::Normal(segment) => segment.to_str(),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
        })
        .unwrap_or_else(|| Some(Vec::new()))?
        .join("/");

    Some(KeyEntry {
        gun,
        fingerprint: Fingerprint::new(fingerprint),
    })
}

/// Enumerate every key file under `root`.
///
/// The sequence is lazy and each call walks from scratch. Unreadable entries
/// are skipped rather than ending the scan.
pub fn scan<'a, W>(walker: &'a W, root: &'a Path) -> impl Iterator<Item = KeyEntry> + 'a
where
    W: DirectoryWalker + ?Sized,
{
    walker.walk(root).filter_map(move |entry| match entry {
        Ok(WalkEntry { is_dir: true, .. }) => None,
        Ok(WalkEntry { path, .. }) => decode_key_path(root, &path),
        Err(err) => {
            debug!(root = %root.display(), error = %err, "skipping unreadable key namespace entry");
            None
        }
    })
}

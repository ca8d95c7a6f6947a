use crate::repository::api::{NodeDescriptor, RepositoryError};
use crate::repository::source::{SourceItem, TreeSource};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const NODE_FILE: &str = "node.json";

/// FsTreeSource reads a repository tree from a directory.
///
/// Each directory is an entry. A directory holding a `node.json` is a node; a node directory without
/// sub-directories is a leaf. Names starting with `.` or containing `.` are not entries.
pub struct FsTreeSource {
    root: PathBuf,
}

impl FsTreeSource {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(RepositoryError::Io {
                location: root.display().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "repository root is not a directory"),
            });
        }

        Ok(FsTreeSource { root })
    }

    fn dir(&self, path: &[&str]) -> PathBuf {
        let mut dir = self.root.clone();
        dir.extend(path);
        dir
    }

    fn child_dirs(dir: &Path) -> Result<Vec<String>, RepositoryError> {
        let read_dir = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;

        let mut names = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| io_error(dir, e))?;
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if !is_entry_name(&name) {
                continue;
            }
            if dir_entry.file_type().map_err(|e| io_error(dir, e))?.is_dir() {
                names.push(name);
            }
        }
        names.sort();

        Ok(names)
    }
}

fn is_entry_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('.')
}

fn io_error(path: &Path, source: io::Error) -> RepositoryError {
    RepositoryError::Io {
        location: path.display().to_string(),
        source,
    }
}

impl TreeSource for FsTreeSource {
    fn location(&self) -> String {
        format!("file://{}", self.root.display())
    }

    fn list(&self, path: &[&str]) -> Result<Vec<SourceItem>, RepositoryError> {
        let dir = self.dir(path);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for name in Self::child_dirs(&dir)? {
            let child = dir.join(&name);
            let is_leaf = child.join(NODE_FILE).is_file() && Self::child_dirs(&child)?.is_empty();
            items.push(SourceItem { name, is_leaf });
        }

        Ok(items)
    }

    fn read_node(&self, path: &[&str]) -> Result<Option<NodeDescriptor>, RepositoryError> {
        let file = self.dir(path).join(NODE_FILE);
        if !file.is_file() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&file).map_err(|e| io_error(&file, e))?;
        let descriptor = serde_json::from_str(&raw).map_err(|e| RepositoryError::InvalidDescriptor {
            location: file.display().to_string(),
            source: e,
        })?;

        Ok(Some(descriptor))
    }
}

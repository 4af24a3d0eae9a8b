use std::io::ErrorKind;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::backend::Backend;
use crate::core::BackendError;
use crate::logging::explorer_debug;
use crate::memory::sort_listing;
use crate::tree::{Node, Tree, file_name, join_path, parent_path};

/// [`Backend`] over the local file system using `std::fs`.
///
/// Calls block the current thread; the explorer only awaits them one at a
/// time. Batch primitives are not offered.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdBackend;

fn map_io(err: std::io::Error, path: &str) -> BackendError {
    match err.kind() {
        ErrorKind::NotFound => BackendError::NotFound(path.to_string()),
        ErrorKind::AlreadyExists => BackendError::AlreadyExists(path.to_string()),
        _ => BackendError::Io(err),
    }
}

fn read_listing(dir: &Path, recursive: bool) -> std::io::Result<Vec<Node>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path().to_string_lossy().to_string();
        let meta = entry.metadata().ok();
        let modified_at = meta
            .as_ref()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        let mut node = if file_type.is_dir() {
            let children = if recursive {
                read_listing(&entry.path(), true)?
            } else {
                Vec::new()
            };
            Node::directory(path, children)
        } else {
            let mut node = Node::file(path);
            node.size = meta.as_ref().filter(|m| m.is_file()).map(|m| m.len());
            node
        };
        node.modified_at = modified_at;
        out.push(node);
    }
    sort_listing(&mut out);
    Ok(out)
}

fn ensure_parent(path: &str) -> Result<(), BackendError> {
    if let Some(parent) = parent_path(path)
        && !Path::new(parent).is_dir()
    {
        return Err(BackendError::NotFound(parent.to_string()));
    }
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    if !std::fs::metadata(from)?.is_dir() {
        std::fs::copy(from, to)?;
        return Ok(());
    }
    std::fs::create_dir(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        copy_tree(&entry.path(), &to.join(entry.file_name()))?;
    }
    Ok(())
}

fn move_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    if std::fs::metadata(from)?.is_dir() {
        copy_tree(from, to)?;
        std::fs::remove_dir_all(from)
    } else {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)
    }
}

impl Backend for StdBackend {
    async fn list_directory(&self, root: &str, recursive: bool) -> Result<Tree, BackendError> {
        if !Path::new(root).is_dir() {
            return Err(BackendError::NotFound(root.to_string()));
        }
        let nodes = read_listing(Path::new(root), recursive).map_err(|e| map_io(e, root))?;
        Ok(Tree::new(nodes))
    }

    async fn create_file(&self, path: &str) -> Result<(), BackendError> {
        ensure_parent(path)?;
        std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| map_io(e, path))?;
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> Result<(), BackendError> {
        ensure_parent(path)?;
        std::fs::create_dir(path).map_err(|e| map_io(e, path))
    }

    async fn rename(&self, old_path: &str, new_name: &str) -> Result<(), BackendError> {
        if !Path::new(old_path).exists() {
            return Err(BackendError::NotFound(old_path.to_string()));
        }
        let target = join_path(parent_path(old_path).unwrap_or(""), new_name);
        if Path::new(&target).exists() {
            return Err(BackendError::Conflict(target));
        }
        std::fs::rename(old_path, &target).map_err(|e| map_io(e, old_path))
    }

    async fn delete(&self, path: &str, is_directory: bool) -> Result<(), BackendError> {
        let res = if is_directory {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        res.map_err(|e| map_io(e, path))
    }

    async fn move_path(&self, source: &str, destination: &str) -> Result<(), BackendError> {
        if !Path::new(source).exists() {
            return Err(BackendError::NotFound(source.to_string()));
        }
        if !Path::new(destination).is_dir() {
            return Err(BackendError::NotFound(destination.to_string()));
        }
        let target = join_path(destination, file_name(source));
        if Path::new(&target).exists() {
            return Err(BackendError::Conflict(target));
        }
        explorer_debug!(event = "std.move", source, dest = %target, "moving path");
        move_tree(Path::new(source), Path::new(&target)).map_err(|e| map_io(e, source))
    }
}

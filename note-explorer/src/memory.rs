use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use crate::backend::{Backend, DeleteItem};
use crate::core::BackendError;
use crate::logging::explorer_trace;
use crate::tree::{Node, Tree, file_name, is_ancestor, join_path, parent_path};

/// A call observed by [`MemoryBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    /// `list_directory`
    List {
        /// Listed root.
        root: String,
        /// Recursive flag.
        recursive: bool,
    },
    /// `create_file`
    CreateFile(String),
    /// `create_directory`
    CreateDirectory(String),
    /// `rename`
    Rename {
        /// Renamed path.
        path: String,
        /// New base name.
        new_name: String,
    },
    /// `delete`
    Delete {
        /// Deleted path.
        path: String,
        /// Directory flag.
        is_directory: bool,
    },
    /// `delete_many`
    DeleteMany(Vec<DeleteItem>),
    /// `move_path`
    Move {
        /// Moved path.
        source: String,
        /// Destination directory.
        destination: String,
    },
    /// `move_many`
    MoveMany {
        /// Moved paths.
        sources: Vec<String>,
        /// Destination directory.
        destination: String,
    },
}

#[derive(Debug, Default)]
struct MemoryState {
    root: String,
    // path -> is_directory
    entries: BTreeMap<String, bool>,
    calls: Vec<BackendCall>,
    batch_moves: bool,
    batch_deletes: bool,
    failing: HashSet<String>,
}

impl MemoryState {
    fn is_dir_or_root(&self, path: &str) -> bool {
        path == self.root || self.entries.get(path).copied().unwrap_or(false)
    }

    fn check_failing(&self, path: &str) -> Result<(), BackendError> {
        if self.failing.contains(path) {
            return Err(BackendError::Failure(format!("injected failure for {path}")));
        }
        Ok(())
    }

    fn insert(&mut self, path: &str, is_directory: bool) -> Result<(), BackendError> {
        self.check_failing(path)?;
        if self.entries.contains_key(path) {
            return Err(BackendError::AlreadyExists(path.to_string()));
        }
        let parent = parent_path(path).unwrap_or(self.root.as_str());
        if !self.is_dir_or_root(parent) {
            return Err(BackendError::NotFound(parent.to_string()));
        }
        self.entries.insert(path.to_string(), is_directory);
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), BackendError> {
        self.check_failing(path)?;
        if self.entries.remove(path).is_none() {
            return Err(BackendError::NotFound(path.to_string()));
        }
        self.entries.retain(|p, _| !is_ancestor(path, p));
        Ok(())
    }

    fn relocate(&mut self, from: &str, to: &str) -> Result<(), BackendError> {
        self.check_failing(from)?;
        if !self.entries.contains_key(from) {
            return Err(BackendError::NotFound(from.to_string()));
        }
        if self.entries.contains_key(to) {
            return Err(BackendError::Conflict(to.to_string()));
        }
        if from == to || is_ancestor(from, to) {
            return Err(BackendError::Conflict(to.to_string()));
        }
        let moved: Vec<(String, bool)> = self
            .entries
            .iter()
            .filter(|(p, _)| p.as_str() == from || is_ancestor(from, p))
            .map(|(p, d)| (p.clone(), *d))
            .collect();
        for (path, is_dir) in moved {
            self.entries.remove(&path);
            self.entries.insert(format!("{to}{}", &path[from.len()..]), is_dir);
        }
        Ok(())
    }

    fn move_into(&mut self, source: &str, destination: &str) -> Result<(), BackendError> {
        if !self.is_dir_or_root(destination) {
            return Err(BackendError::NotFound(destination.to_string()));
        }
        let to = join_path(destination, file_name(source));
        self.relocate(source, &to)
    }

    fn children_of(&self, dir: &str, recursive: bool) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .entries
            .iter()
            .filter(|(p, _)| parent_path(p) == Some(dir))
            .map(|(p, is_dir)| {
                if *is_dir {
                    let children = if recursive {
                        self.children_of(p, true)
                    } else {
                        Vec::new()
                    };
                    Node::directory(p.clone(), children)
                } else {
                    Node::file(p.clone())
                }
            })
            .collect();
        sort_listing(&mut nodes);
        nodes
    }
}

/// Directories first, then case-insensitive name order.
pub(crate) fn sort_listing(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// In-memory [`Backend`] with a call log.
///
/// Clones share state, so a test can keep a handle while the explorer owns
/// another. Batch primitives are off until enabled.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryBackend {
    /// Creates an empty backend rooted at `root`.
    pub fn new(root: impl Into<String>) -> Self {
        let state = MemoryState {
            root: root.into(),
            ..MemoryState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Adds a file; parent directories are not created implicitly.
    pub fn with_file(self, path: impl Into<String>) -> Self {
        self.state.borrow_mut().entries.insert(path.into(), false);
        self
    }

    /// Adds a directory.
    pub fn with_directory(self, path: impl Into<String>) -> Self {
        self.state.borrow_mut().entries.insert(path.into(), true);
        self
    }

    /// Enables `move_many`.
    pub fn with_batch_moves(self) -> Self {
        self.state.borrow_mut().batch_moves = true;
        self
    }

    /// Enables `delete_many`.
    pub fn with_batch_deletes(self) -> Self {
        self.state.borrow_mut().batch_deletes = true;
        self
    }

    /// Makes every mutation touching `path` fail.
    pub fn fail_on(self, path: impl Into<String>) -> Self {
        self.state.borrow_mut().failing.insert(path.into());
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.borrow().calls.clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Returns whether `path` exists.
    pub fn exists(&self, path: &str) -> bool {
        self.state.borrow().entries.contains_key(path)
    }

    fn record(&self, call: BackendCall) -> std::cell::RefMut<'_, MemoryState> {
        let mut state = self.state.borrow_mut();
        explorer_trace!(event = "memory.call", ?call, "backend call");
        state.calls.push(call);
        state
    }
}

impl Backend for MemoryBackend {
    async fn list_directory(&self, root: &str, recursive: bool) -> Result<Tree, BackendError> {
        let state = self.record(BackendCall::List {
            root: root.to_string(),
            recursive,
        });
        if !state.is_dir_or_root(root) {
            return Err(BackendError::NotFound(root.to_string()));
        }
        Ok(Tree::new(state.children_of(root, recursive)))
    }

    async fn create_file(&self, path: &str) -> Result<(), BackendError> {
        self.record(BackendCall::CreateFile(path.to_string()))
            .insert(path, false)
    }

    async fn create_directory(&self, path: &str) -> Result<(), BackendError> {
        self.record(BackendCall::CreateDirectory(path.to_string()))
            .insert(path, true)
    }

    async fn rename(&self, old_path: &str, new_name: &str) -> Result<(), BackendError> {
        let mut state = self.record(BackendCall::Rename {
            path: old_path.to_string(),
            new_name: new_name.to_string(),
        });
        let parent = parent_path(old_path).unwrap_or("").to_string();
        state.relocate(old_path, &join_path(&parent, new_name))
    }

    async fn delete(&self, path: &str, is_directory: bool) -> Result<(), BackendError> {
        self.record(BackendCall::Delete {
            path: path.to_string(),
            is_directory,
        })
        .remove(path)
    }

    async fn delete_many(&self, items: &[DeleteItem]) -> Result<(), BackendError> {
        if !self.state.borrow().batch_deletes {
            return Err(BackendError::Unsupported);
        }
        let mut state = self.record(BackendCall::DeleteMany(items.to_vec()));
        let mut first_err = None;
        for item in items {
            if let Err(err) = state.remove(&item.path) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    async fn move_path(&self, source: &str, destination: &str) -> Result<(), BackendError> {
        self.record(BackendCall::Move {
            source: source.to_string(),
            destination: destination.to_string(),
        })
        .move_into(source, destination)
    }

    async fn move_many(&self, sources: &[String], destination: &str) -> Result<(), BackendError> {
        if !self.state.borrow().batch_moves {
            return Err(BackendError::Unsupported);
        }
        let mut state = self.record(BackendCall::MoveMany {
            sources: sources.to_vec(),
            destination: destination.to_string(),
        });
        let mut first_err = None;
        for source in sources {
            if let Err(err) = state.move_into(source, destination) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

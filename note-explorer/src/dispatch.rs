use crate::backend::{Backend, DeleteConfirmation, DeleteItem, Unconfirmed};
use crate::core::BackendError;
use crate::logging::{explorer_debug, explorer_warn};
use crate::tree::Tree;

/// A committed user intent, ready for the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Move `sources` into the directory `destination`.
    Move {
        /// Paths to move, in selection/drag order.
        sources: Vec<String>,
        /// Destination directory (the root path for a root drop).
        destination: String,
    },
    /// Delete `items` after confirmation.
    Delete {
        /// Paths to delete, in selection order.
        items: Vec<DeleteItem>,
    },
    /// Create an empty file.
    CreateFile {
        /// Full path of the new file.
        path: String,
    },
    /// Create a directory.
    CreateDirectory {
        /// Full path of the new directory.
        path: String,
    },
    /// Rename a path within its parent.
    Rename {
        /// Path being renamed.
        path: String,
        /// New base name.
        new_name: String,
    },
    /// Re-pull the listing without mutating anything.
    Refresh,
}

/// Translates intents into backend calls.
///
/// Multi-item moves and deletes prefer the backend's batch primitive and fall
/// back to one awaited call per item, in order, when it is unsupported. A
/// failing item is logged and the loop continues. Failures never propagate
/// out of [`OperationDispatcher::execute`].
#[derive(Debug)]
pub struct OperationDispatcher<B, C = Unconfirmed> {
    backend: B,
    confirm: C,
    root: String,
    recursive: bool,
}

impl<B: Backend> OperationDispatcher<B, Unconfirmed> {
    /// Creates a dispatcher that deletes without confirmation.
    pub fn new(backend: B, root: impl Into<String>, recursive: bool) -> Self {
        Self {
            backend,
            confirm: Unconfirmed,
            root: root.into(),
            recursive,
        }
    }
}

impl<B: Backend, C: DeleteConfirmation> OperationDispatcher<B, C> {
    /// Replaces the delete confirmation collaborator.
    pub fn with_confirmation<C2: DeleteConfirmation>(
        self,
        confirm: C2,
    ) -> OperationDispatcher<B, C2> {
        OperationDispatcher {
            backend: self.backend,
            confirm,
            root: self.root,
            recursive: self.recursive,
        }
    }

    /// Backend collaborator.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs `intent` and returns whether the listing must be refreshed.
    ///
    /// Moves, confirmed deletes and explicit refreshes always ask for a
    /// refresh. Creates and renames only do so on success. A declined or empty
    /// delete issues no backend call.
    pub async fn execute(&self, intent: &Intent) -> bool {
        match intent {
            Intent::Move {
                sources,
                destination,
            } => {
                self.move_sources(sources, destination).await;
                true
            }
            Intent::Delete { items } => {
                if items.is_empty() {
                    return false;
                }
                if !self.confirm.confirm_delete(items).await {
                    explorer_debug!(
                        event = "dispatch.delete_declined",
                        count = items.len(),
                        "delete declined"
                    );
                    return false;
                }
                self.delete_items(items).await;
                true
            }
            Intent::CreateFile { path } => {
                report("create_file", path, self.backend.create_file(path).await)
            }
            Intent::CreateDirectory { path } => report(
                "create_directory",
                path,
                self.backend.create_directory(path).await,
            ),
            Intent::Rename { path, new_name } => {
                report("rename", path, self.backend.rename(path, new_name).await)
            }
            Intent::Refresh => true,
        }
    }

    /// Pulls a fresh listing of the root.
    pub async fn refresh(&self) -> Result<Tree, BackendError> {
        self.backend.list_directory(&self.root, self.recursive).await
    }

    async fn move_sources(&self, sources: &[String], destination: &str) {
        if sources.len() > 1 {
            match self.backend.move_many(sources, destination).await {
                Ok(()) => return,
                Err(err) if err.is_unsupported() => {}
                Err(err) => {
                    explorer_warn!(event = "dispatch.move_many_failed", %err, "batch move failed");
                    return;
                }
            }
        }
        for source in sources {
            if let Err(err) = self.backend.move_path(source, destination).await {
                explorer_warn!(event = "dispatch.move_failed", path = %source, %err, "move failed");
            }
        }
    }

    async fn delete_items(&self, items: &[DeleteItem]) {
        if items.len() > 1 {
            match self.backend.delete_many(items).await {
                Ok(()) => return,
                Err(err) if err.is_unsupported() => {}
                Err(err) => {
                    explorer_warn!(event = "dispatch.delete_many_failed", %err, "batch delete failed");
                    return;
                }
            }
        }
        for item in items {
            if let Err(err) = self.backend.delete(&item.path, item.is_directory).await {
                explorer_warn!(event = "dispatch.delete_failed", path = %item.path, %err, "delete failed");
            }
        }
    }
}

fn report(op: &'static str, path: &str, result: Result<(), BackendError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            explorer_warn!(event = "dispatch.failed", op, path, %err, "backend call failed");
            false
        }
    }
}

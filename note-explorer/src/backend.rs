use crate::core::BackendError;
use crate::tree::Tree;

/// One entry of a delete request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteItem {
    /// Path to delete.
    pub path: String,
    /// Whether the path is a directory (deleted recursively).
    pub is_directory: bool,
}

impl DeleteItem {
    /// Creates a delete item.
    pub fn new(path: impl Into<String>, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            is_directory,
        }
    }
}

/// Storage the explorer reads listings from and sends mutations to.
///
/// The batch primitives are optional: the default implementations report
/// [`BackendError::Unsupported`] and callers fall back to one call per item.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Lists the tree under `root`, recursing into subdirectories when asked.
    async fn list_directory(&self, root: &str, recursive: bool) -> Result<Tree, BackendError>;
    /// Creates an empty file at `path`.
    async fn create_file(&self, path: &str) -> Result<(), BackendError>;
    /// Creates a directory at `path`.
    async fn create_directory(&self, path: &str) -> Result<(), BackendError>;
    /// Renames `old_path` to `new_name` within the same parent directory.
    async fn rename(&self, old_path: &str, new_name: &str) -> Result<(), BackendError>;
    /// Deletes `path`; directories are removed recursively.
    async fn delete(&self, path: &str, is_directory: bool) -> Result<(), BackendError>;
    /// Deletes several paths in one call.
    async fn delete_many(&self, items: &[DeleteItem]) -> Result<(), BackendError> {
        let _ = items;
        Err(BackendError::Unsupported)
    }
    /// Moves `source` into the directory `destination`.
    async fn move_path(&self, source: &str, destination: &str) -> Result<(), BackendError>;
    /// Moves several paths into `destination` in one call.
    async fn move_many(&self, sources: &[String], destination: &str) -> Result<(), BackendError> {
        let _ = (sources, destination);
        Err(BackendError::Unsupported)
    }
}

/// Asks the user to confirm a delete before it reaches the backend.
#[allow(async_fn_in_trait)]
pub trait DeleteConfirmation {
    /// Returns `true` when the user accepts deleting `items`.
    async fn confirm_delete(&self, items: &[DeleteItem]) -> bool;
}

/// Confirmation that accepts every delete.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unconfirmed;

impl DeleteConfirmation for Unconfirmed {
    async fn confirm_delete(&self, _items: &[DeleteItem]) -> bool {
        true
    }
}

/// Synchronous confirmation callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfirmWith<F>(pub F);

impl<F> DeleteConfirmation for ConfirmWith<F>
where
    F: Fn(&[DeleteItem]) -> bool,
{
    async fn confirm_delete(&self, items: &[DeleteItem]) -> bool {
        (self.0)(items)
    }
}

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`Backend`](crate::Backend) collaborator.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Path (or its parent) does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// Create target already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Rename/move target collides with an existing entry
    #[error("conflict: {0}")]
    Conflict(String),
    /// Optional primitive not offered by this backend
    #[error("unsupported operation for backend")]
    Unsupported,
    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other backend failure
    #[error("backend failure: {0}")]
    Failure(String),
}

impl BackendError {
    /// Returns `true` when the error only signals a missing optional primitive.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, BackendError::Unsupported)
    }
}

/// Keyboard/mouse modifier keys used by selection semantics.
///
/// Either key counts as "the" multi-select modifier (Ctrl on Windows/Linux,
/// Cmd on macOS).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl key held.
    pub ctrl: bool,
    /// Meta (Cmd/Super) key held.
    pub meta: bool,
}

impl Modifiers {
    /// No modifier held.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
    };

    /// Ctrl held.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        meta: false,
    };

    /// Returns whether the multi-select modifier is held.
    pub fn multi_select(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Kind of entry an inline create session produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CreateKind {
    /// A note file
    File,
    /// A directory
    Directory,
}

/// Explorer configuration.
///
/// Examples
/// ```
/// use note_explorer::ExplorerConfig;
/// use std::time::Duration;
/// let cfg = ExplorerConfig::new("/notes")
///     .recursive(true)
///     .double_click_threshold(Duration::from_millis(250))
///     .expanded_dirs(["/notes/journal"]);
/// assert_eq!(cfg.root(), "/notes");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExplorerConfig {
    pub(crate) root: String,
    pub(crate) recursive: bool,
    pub(crate) double_click_ms: u64,
    pub(crate) default_file_name: String,
    pub(crate) default_directory_name: String,
    pub(crate) note_extension: String,
    pub(crate) expanded_dirs: Vec<String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            recursive: true,
            double_click_ms: 300,
            default_file_name: "New note.md".to_string(),
            default_directory_name: "New directory".to_string(),
            note_extension: ".md".to_string(),
            expanded_dirs: Vec::new(),
        }
    }
}

impl ExplorerConfig {
    /// Create a configuration rooted at `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Request recursive listings from the backend (default `true`).
    pub fn recursive(mut self, yes: bool) -> Self {
        self.recursive = yes;
        self
    }
    /// Max delay between two clicks on the same file that opens it in a new tab.
    pub fn double_click_threshold(mut self, threshold: Duration) -> Self {
        self.double_click_ms = threshold.as_millis() as u64;
        self
    }
    /// Name used when a file is created with an empty name.
    pub fn default_file_name(mut self, name: impl Into<String>) -> Self {
        self.default_file_name = name.into();
        self
    }
    /// Name used when a directory is created with an empty name.
    pub fn default_directory_name(mut self, name: impl Into<String>) -> Self {
        self.default_directory_name = name.into();
        self
    }
    /// Extension appended to new file names that lack it (with the dot).
    pub fn note_extension(mut self, ext: impl Into<String>) -> Self {
        self.note_extension = ext.into();
        self
    }
    /// Directories expanded on mount (usually restored from persisted state).
    pub fn expanded_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expanded_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Explorer root path.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Double-click threshold.
    pub fn double_click(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

#![deny(missing_docs)]
//! Interaction and state-reconciliation core for a note-taking app's file
//! explorer panel.
//!
//! The crate owns selection, drag-and-drop moves, inline create/rename
//! sessions, context-menu routing and keyboard deletion, and reconciles them
//! against an async [`Backend`] that may only offer single-item mutations.
//! Rendering is left to the host: it feeds [`ExplorerEvent`]s in and acts on
//! the returned [`ExplorerOutcome`]s.
//!
//! The displayed [`Tree`] is never patched in place. Every mutation is
//! followed by a full listing refresh.
//!
//! ```
//! use note_explorer::{Explorer, ExplorerConfig, ExplorerEvent, MemoryBackend, Modifiers};
//!
//! let backend = MemoryBackend::new("/notes").with_file("/notes/todo.md");
//! let mut explorer = Explorer::new(backend, ExplorerConfig::new("/notes"));
//! pollster::block_on(explorer.mount()).unwrap();
//! explorer.handle_event(ExplorerEvent::Click {
//!     path: "/notes/todo.md".into(),
//!     modifiers: Modifiers::NONE,
//! });
//! assert!(explorer.selection().contains("/notes/todo.md"));
//! ```

mod logging;

mod backend;
mod context_menu;
mod core;
mod dispatch;
mod drag;
mod edit;
mod expansion;
mod explorer;
mod keys;
mod memory;
mod selection;
mod std_backend;
mod tree;

pub use backend::{Backend, ConfirmWith, DeleteConfirmation, DeleteItem, Unconfirmed};
pub use context_menu::{ContextMenuController, ContextMenuState, MenuAction, MenuItem};
pub use core::{BackendError, CreateKind, ExplorerConfig, Modifiers};
pub use dispatch::{Intent, OperationDispatcher};
pub use drag::{DragController, DragPayload, DragSession, DropEffect, DropTarget, MoveIntent};
pub use edit::{EditKind, EditSession, EditSessionController};
pub use expansion::ExpansionState;
pub use explorer::{Explorer, ExplorerEvent, ExplorerOutcome, Lifecycle};
pub use keys::{Key, KeySource, SubscriptionId, WindowKeys};
pub use logging::{init_tracing, init_tracing_with_filter};
pub use memory::{BackendCall, MemoryBackend};
pub use selection::{ClickOutcome, OpenIntent, SelectionController};
pub use std_backend::StdBackend;
pub use tree::{
    Node, NodeInfo, Tree, TreeIndex, file_name, is_ancestor, join_path, parent_path,
};

use indexmap::IndexSet;

use crate::logging::explorer_trace;
use crate::selection::SelectionController;
use crate::tree::{TreeIndex, is_ancestor, parent_path};

/// Data carried by a drag gesture.
///
/// `paths` is the structured multi-path representation; `text` is a single
/// bare path for sources (or targets) that only understand plain text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DragPayload {
    /// Structured list of source paths.
    pub paths: Vec<String>,
    /// Plain-text fallback holding one path.
    pub text: Option<String>,
}

impl DragPayload {
    /// Payload carrying both representations of `paths`.
    pub fn from_paths(paths: Vec<String>) -> Self {
        let text = paths.first().cloned();
        Self { paths, text }
    }

    /// Payload from a plain-text-only source.
    pub fn plain_text(path: impl Into<String>) -> Self {
        Self {
            paths: Vec::new(),
            text: Some(path.into()),
        }
    }

    /// Transferred source paths, preferring the structured representation.
    pub fn source_paths(&self) -> Vec<String> {
        if !self.paths.is_empty() {
            return self.paths.clone();
        }
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| vec![t.to_string()])
            .unwrap_or_default()
    }
}

/// Feedback for a hovered drop target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropEffect {
    /// Target accepts a move.
    Move,
    /// Target is not a drop zone.
    NotAllowed,
}

/// Where dropped paths should land.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropTarget {
    /// The explorer root drop zone.
    Root,
    /// A directory node.
    Directory(String),
}

/// Filtered move produced by a drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveIntent {
    /// Paths to move, in drag-set order.
    pub sources: Vec<String>,
    /// Destination of the move.
    pub target: DropTarget,
}

/// In-progress drag gesture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DragSession {
    dragged: IndexSet<String>,
    hover_target: Option<String>,
}

impl DragSession {
    /// Dragged paths in drag-set order.
    pub fn dragged_paths(&self) -> Vec<String> {
        self.dragged.iter().cloned().collect()
    }

    /// Directory currently hovered, if any.
    pub fn hover_target(&self) -> Option<&str> {
        self.hover_target.as_deref()
    }
}

/// Owns the transient drag session and validates proposed moves.
#[derive(Clone, Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    /// Active drag session.
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Returns whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a drag on `path`.
    ///
    /// Dragging a member of a multi-selection drags the whole selection;
    /// dragging anything else drags only it and makes it the selection.
    pub fn drag_start(&mut self, path: &str, selection: &mut SelectionController) -> DragPayload {
        let dragged: IndexSet<String> = if selection.contains(path) && selection.len() > 1 {
            selection.paths().into_iter().collect()
        } else {
            selection.select_only(path);
            std::iter::once(path.to_string()).collect()
        };
        let payload = DragPayload::from_paths(dragged.iter().cloned().collect());
        explorer_trace!(event = "drag.start", path, count = dragged.len(), "drag started");
        self.session = Some(DragSession {
            dragged,
            hover_target: None,
        });
        payload
    }

    /// Hover feedback for `target`; only directories accept drops.
    pub fn drag_over(&mut self, target: &str, is_directory: bool) -> DropEffect {
        if !is_directory {
            return DropEffect::NotAllowed;
        }
        if let Some(session) = self.session.as_mut() {
            session.hover_target = Some(target.to_string());
        }
        DropEffect::Move
    }

    /// Drop on directory `target`.
    ///
    /// Sources equal to the target or containing it are discarded. The session
    /// is cleared whatever the result.
    pub fn drop_on(&mut self, target: &str, payload: &DragPayload) -> Option<MoveIntent> {
        self.session = None;
        let sources = dedup(payload.source_paths())
            .into_iter()
            .filter(|src| src != target && !is_ancestor(src, target))
            .collect::<Vec<_>>();
        explorer_trace!(event = "drag.drop", dest = target, accepted = sources.len(), "drop");
        if sources.is_empty() {
            return None;
        }
        Some(MoveIntent {
            sources,
            target: DropTarget::Directory(target.to_string()),
        })
    }

    /// Drop on the root zone.
    ///
    /// Sources already sitting at root level are no-op moves and discarded.
    pub fn drop_on_root(
        &mut self,
        payload: &DragPayload,
        index: &TreeIndex,
        root: &str,
    ) -> Option<MoveIntent> {
        self.session = None;
        let sources = dedup(payload.source_paths())
            .into_iter()
            .filter(|src| src != root && !is_root_level(src, index, root))
            .collect::<Vec<_>>();
        explorer_trace!(event = "drag.drop_root", accepted = sources.len(), "drop on root");
        if sources.is_empty() {
            return None;
        }
        Some(MoveIntent {
            sources,
            target: DropTarget::Root,
        })
    }

    /// Ends the gesture without a drop (Escape, drop outside any target).
    pub fn drag_end(&mut self) {
        self.session = None;
    }
}

fn dedup(paths: Vec<String>) -> Vec<String> {
    paths.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

fn is_root_level(path: &str, index: &TreeIndex, root: &str) -> bool {
    match index.lookup(path) {
        Some(info) => info.parent.is_none(),
        None => match parent_path(path) {
            Some(parent) => parent.trim_end_matches('/') == root.trim_end_matches('/'),
            None => true,
        },
    }
}

use std::cell::Cell;
use std::rc::Rc;

use crate::backend::{Backend, DeleteConfirmation, DeleteItem, Unconfirmed};
use crate::context_menu::{ContextMenuController, MenuAction};
use crate::core::{BackendError, CreateKind, ExplorerConfig, Modifiers};
use crate::dispatch::{Intent, OperationDispatcher};
use crate::drag::{DragController, DragPayload, DropEffect, DropTarget, MoveIntent};
use crate::edit::EditSessionController;
use crate::expansion::ExpansionState;
use crate::keys::{Key, KeySource, SubscriptionId};
use crate::logging::{explorer_debug, explorer_trace, explorer_warn};
use crate::selection::{OpenIntent, SelectionController};
use crate::tree::{Tree, TreeIndex, file_name};

/// Liveness flag shared between an explorer and its pending async work.
///
/// Results of backend calls that resolve after [`Lifecycle::teardown`] are
/// discarded instead of being applied.
#[derive(Clone, Debug)]
pub struct Lifecycle(Rc<Cell<bool>>);

impl Default for Lifecycle {
    fn default() -> Self {
        Self(Rc::new(Cell::new(true)))
    }
}

impl Lifecycle {
    /// Returns whether the owner is still mounted.
    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    /// Marks the owner as torn down.
    pub fn teardown(&self) {
        self.0.set(false);
    }
}

/// Input event for driving the explorer without direct UI coupling.
#[derive(Clone, Debug)]
pub enum ExplorerEvent {
    /// Click on a node.
    Click {
        /// Clicked path.
        path: String,
        /// Modifier keys held.
        modifiers: Modifiers,
    },
    /// Click on empty content area.
    BackgroundClick,
    /// Right-click; `target` is `None` for the root area.
    ContextMenu {
        /// Pointer position.
        position: [f32; 2],
        /// Node under the pointer.
        target: Option<String>,
    },
    /// Entry chosen in the open context menu.
    MenuAction(MenuAction),
    /// Click outside the open context menu.
    OutsideClick,
    /// Drag gesture started on a node.
    DragStart {
        /// Dragged path.
        path: String,
    },
    /// Drag hovering a node.
    DragOver {
        /// Hovered path.
        target: String,
    },
    /// Drop on a node.
    Drop {
        /// Path dropped on.
        target: String,
        /// Transferred data.
        payload: DragPayload,
    },
    /// Drop on the root zone.
    DropOnRoot {
        /// Transferred data.
        payload: DragPayload,
    },
    /// Drag cancelled or dropped outside any target.
    DragEnd,
    /// Open a create session; `parent` defaults to the root.
    StartCreate {
        /// Kind of entry.
        kind: CreateKind,
        /// Parent directory.
        parent: Option<String>,
    },
    /// Open a rename session.
    StartRename {
        /// Path to rename.
        path: String,
    },
    /// Inline field text changed.
    EditInput(String),
    /// Enter pressed or inline field lost focus.
    CommitEdit,
    /// Edit cancelled.
    CancelEdit,
    /// Window key delivered through the explorer's key subscription.
    Key(Key),
    /// Expand or collapse one directory.
    ToggleExpanded {
        /// Directory path.
        path: String,
    },
    /// Expand every directory of the tree.
    ExpandAll,
    /// Collapse every directory.
    CollapseAll,
}

/// Side effect emitted after applying an [`ExplorerEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExplorerOutcome {
    /// No extra action required by host/UI.
    None,
    /// The host should open a file.
    Open(OpenIntent),
    /// A drag started; the host should carry this payload.
    DragStarted(DragPayload),
    /// Hover feedback for the current drag.
    DropEffect(DropEffect),
    /// A committed intent to run through [`Explorer::apply`].
    Dispatch(Intent),
}

/// File explorer core: controllers, tree index and dispatcher behind one
/// event entry point.
pub struct Explorer<B, C = Unconfirmed> {
    config: ExplorerConfig,
    dispatcher: OperationDispatcher<B, C>,
    index: TreeIndex,
    selection: SelectionController,
    expansion: ExpansionState,
    drag: DragController,
    edit: EditSessionController,
    menu: ContextMenuController,
    lifecycle: Lifecycle,
    keys: Option<(Rc<dyn KeySource>, SubscriptionId)>,
}

impl<B: Backend> Explorer<B, Unconfirmed> {
    /// Creates an explorer over `backend`. Call [`Explorer::mount`] to load
    /// the first listing.
    pub fn new(backend: B, config: ExplorerConfig) -> Self {
        let dispatcher = OperationDispatcher::new(backend, config.root(), config.recursive);
        Self {
            selection: SelectionController::new(config.double_click()),
            expansion: ExpansionState::with_expanded(config.expanded_dirs.iter().cloned()),
            edit: EditSessionController::new(&config),
            dispatcher,
            index: TreeIndex::default(),
            drag: DragController::default(),
            menu: ContextMenuController::default(),
            lifecycle: Lifecycle::default(),
            keys: None,
            config,
        }
    }
}

impl<B: Backend, C: DeleteConfirmation> Explorer<B, C> {
    /// Routes deletes through `confirm` first.
    pub fn with_confirmation<C2: DeleteConfirmation>(self, confirm: C2) -> Explorer<B, C2> {
        Explorer {
            config: self.config,
            dispatcher: self.dispatcher.with_confirmation(confirm),
            index: self.index,
            selection: self.selection,
            expansion: self.expansion,
            drag: self.drag,
            edit: self.edit,
            menu: self.menu,
            lifecycle: self.lifecycle,
            keys: self.keys,
        }
    }

    /// Installs the listener fired with all expanded paths on every
    /// expand/collapse change.
    pub fn on_expanded_dirs_change<F>(&mut self, listener: F)
    where
        F: FnMut(&[String]) + 'static,
    {
        self.expansion.set_on_change(listener);
    }

    /// Subscribes to Delete and Escape on `source`, replacing any earlier
    /// subscription.
    pub fn subscribe_keys(&mut self, source: Rc<dyn KeySource>) {
        self.unsubscribe_keys();
        let id = source.subscribe(&[Key::Delete, Key::Escape]);
        explorer_trace!(event = "explorer.keys_subscribed", id = id.0, "keys subscribed");
        self.keys = Some((source, id));
    }

    fn unsubscribe_keys(&mut self) {
        if let Some((source, id)) = self.keys.take() {
            source.unsubscribe(id);
        }
    }

    /// Loads the initial listing.
    pub async fn mount(&mut self) -> Result<(), BackendError> {
        let tree = self.dispatcher.refresh().await?;
        if self.lifecycle.is_alive() {
            explorer_debug!(event = "explorer.mount", root = %self.config.root, "mounted");
            self.index = TreeIndex::new(tree);
            self.reconcile();
        }
        Ok(())
    }

    /// Tears the explorer down: pending results are discarded, key
    /// registrations are dropped and transient sessions are cleared.
    pub fn teardown(&mut self) {
        self.lifecycle.teardown();
        self.unsubscribe_keys();
        self.drag.drag_end();
        self.edit.cancel();
        self.menu.close();
    }

    /// Re-pulls the listing and replaces the tree.
    ///
    /// Returns whether the tree was replaced. Failures are logged and the
    /// previous tree is kept; a listing arriving after teardown is dropped.
    pub async fn refresh(&mut self) -> bool {
        let result = self.dispatcher.refresh().await;
        if !self.lifecycle.is_alive() {
            explorer_trace!(event = "explorer.stale_refresh", "listing after teardown discarded");
            return false;
        }
        match result {
            Ok(tree) => {
                self.index = TreeIndex::new(tree);
                self.reconcile();
                true
            }
            Err(err) => {
                explorer_warn!(event = "explorer.refresh_failed", %err, "refresh failed");
                false
            }
        }
    }

    fn reconcile(&mut self) {
        let pruned = self.selection.retain_existing(&self.index);
        if pruned > 0 {
            explorer_trace!(event = "explorer.selection_pruned", pruned, "stale selection dropped");
        }
    }

    /// Runs a committed intent, then refreshes when the dispatcher asks for
    /// it. Transient drag and menu state is cleared afterwards; the refresh
    /// prunes selected paths the new tree no longer holds.
    pub async fn apply(&mut self, intent: Intent) {
        if !self.lifecycle.is_alive() {
            return;
        }
        explorer_debug!(event = "explorer.apply", ?intent, "applying intent");
        let needs_refresh = self.dispatcher.execute(&intent).await;
        if !self.lifecycle.is_alive() {
            return;
        }
        self.drag.drag_end();
        self.menu.close();
        if needs_refresh {
            self.refresh().await;
        }
    }

    /// Handles `event` and applies any intent it commits.
    pub async fn process(&mut self, event: ExplorerEvent) -> ExplorerOutcome {
        let outcome = self.handle_event(event);
        if let ExplorerOutcome::Dispatch(intent) = &outcome {
            self.apply(intent.clone()).await;
        }
        outcome
    }

    /// Apply one event and return the host-facing outcome.
    ///
    /// Events received after teardown are ignored.
    pub fn handle_event(&mut self, event: ExplorerEvent) -> ExplorerOutcome {
        if !self.lifecycle.is_alive() {
            return ExplorerOutcome::None;
        }
        match event {
            ExplorerEvent::Click { path, modifiers } => {
                self.menu.close();
                let is_directory = self.index.is_directory(&path);
                let outcome = self.selection.click(&path, is_directory, modifiers);
                if outcome.toggle_expansion {
                    self.expansion.toggle(&path);
                }
                outcome
                    .open
                    .map_or(ExplorerOutcome::None, ExplorerOutcome::Open)
            }
            ExplorerEvent::BackgroundClick => {
                self.menu.close();
                self.selection.clear_on_background_click();
                ExplorerOutcome::None
            }
            ExplorerEvent::ContextMenu { position, target } => {
                let is_directory = target
                    .as_deref()
                    .is_some_and(|t| self.index.is_directory(t));
                self.menu
                    .open_at(position, target.as_deref(), is_directory, &mut self.selection);
                ExplorerOutcome::None
            }
            ExplorerEvent::MenuAction(action) => self.menu_action(action),
            ExplorerEvent::OutsideClick => {
                self.menu.close();
                ExplorerOutcome::None
            }
            ExplorerEvent::DragStart { path } => {
                if self.edit.is_active() {
                    explorer_trace!(event = "explorer.drag_refused", path = %path, "edit session open");
                    return ExplorerOutcome::None;
                }
                self.menu.close();
                ExplorerOutcome::DragStarted(self.drag.drag_start(&path, &mut self.selection))
            }
            ExplorerEvent::DragOver { target } => {
                let is_directory = self.index.is_directory(&target);
                ExplorerOutcome::DropEffect(self.drag.drag_over(&target, is_directory))
            }
            ExplorerEvent::Drop { target, payload } => {
                if !self.index.is_directory(&target) {
                    self.drag.drag_end();
                    return ExplorerOutcome::None;
                }
                let intent = self.drag.drop_on(&target, &payload);
                self.dispatch_move(intent)
            }
            ExplorerEvent::DropOnRoot { payload } => {
                let intent = self
                    .drag
                    .drop_on_root(&payload, &self.index, &self.config.root);
                self.dispatch_move(intent)
            }
            ExplorerEvent::DragEnd => {
                self.drag.drag_end();
                ExplorerOutcome::None
            }
            ExplorerEvent::StartCreate { kind, parent } => {
                self.start_create(kind, parent.as_deref());
                ExplorerOutcome::None
            }
            ExplorerEvent::StartRename { path } => {
                self.start_rename(&path);
                ExplorerOutcome::None
            }
            ExplorerEvent::EditInput(text) => {
                self.edit.set_draft(text);
                ExplorerOutcome::None
            }
            ExplorerEvent::CommitEdit => self
                .edit
                .commit()
                .map_or(ExplorerOutcome::None, ExplorerOutcome::Dispatch),
            ExplorerEvent::CancelEdit => {
                self.edit.cancel();
                ExplorerOutcome::None
            }
            ExplorerEvent::Key(key) => self.key(key),
            ExplorerEvent::ToggleExpanded { path } => {
                self.expansion.toggle(&path);
                ExplorerOutcome::None
            }
            ExplorerEvent::ExpandAll => {
                self.expansion
                    .expand_all(self.index.all_directory_paths());
                ExplorerOutcome::None
            }
            ExplorerEvent::CollapseAll => {
                self.expansion.collapse_all();
                ExplorerOutcome::None
            }
        }
    }

    fn menu_action(&mut self, action: MenuAction) -> ExplorerOutcome {
        let Some(menu) = self.menu.state().cloned() else {
            return ExplorerOutcome::None;
        };
        self.menu.close();
        match (action, menu.target) {
            (MenuAction::NewFile | MenuAction::NewFolder, target) => {
                let kind = if action == MenuAction::NewFile {
                    CreateKind::File
                } else {
                    CreateKind::Directory
                };
                let parent = match target {
                    Some(path) if menu.is_directory_target => Some(path),
                    Some(path) => self.index.lookup(&path).and_then(|n| n.parent.clone()),
                    None => None,
                };
                self.start_create(kind, parent.as_deref());
                ExplorerOutcome::None
            }
            (MenuAction::Rename, Some(path)) => {
                self.start_rename(&path);
                ExplorerOutcome::None
            }
            (MenuAction::Delete, Some(path)) => {
                let paths = if self.selection.contains(&path) && self.selection.len() > 1 {
                    self.selection.paths()
                } else {
                    vec![path]
                };
                self.delete_intent(paths)
            }
            (MenuAction::Rename | MenuAction::Delete, None) => ExplorerOutcome::None,
        }
    }

    /// Key events only count while a subscription is live; an explorer that
    /// never subscribed, or was torn down, ignores forwarded keys.
    fn key(&mut self, key: Key) -> ExplorerOutcome {
        if self.keys.is_none() {
            explorer_trace!(event = "explorer.key_ignored", ?key, "no key subscription");
            return ExplorerOutcome::None;
        }
        match key {
            Key::Delete => {
                if self.edit.is_active() || self.selection.is_empty() {
                    return ExplorerOutcome::None;
                }
                self.delete_intent(self.selection.paths())
            }
            Key::Escape => {
                if self.edit.is_active() {
                    self.edit.cancel();
                } else {
                    self.drag.drag_end();
                    self.menu.close();
                }
                ExplorerOutcome::None
            }
        }
    }

    fn delete_intent(&self, paths: Vec<String>) -> ExplorerOutcome {
        let items = paths
            .into_iter()
            .map(|p| {
                let is_directory = self.index.is_directory(&p);
                DeleteItem::new(p, is_directory)
            })
            .collect();
        ExplorerOutcome::Dispatch(Intent::Delete { items })
    }

    fn dispatch_move(&self, intent: Option<MoveIntent>) -> ExplorerOutcome {
        let Some(MoveIntent { sources, target }) = intent else {
            return ExplorerOutcome::None;
        };
        let destination = match target {
            DropTarget::Root => self.config.root.clone(),
            DropTarget::Directory(dir) => dir,
        };
        ExplorerOutcome::Dispatch(Intent::Move {
            sources,
            destination,
        })
    }

    fn start_create(&mut self, kind: CreateKind, parent: Option<&str>) {
        self.drag.drag_end();
        self.menu.close();
        if let Some(dir) = parent
            && dir != self.config.root
            && self.index.is_directory(dir)
        {
            self.expansion.expand(dir);
        }
        self.edit.start_create(kind, parent);
    }

    fn start_rename(&mut self, path: &str) {
        self.drag.drag_end();
        self.menu.close();
        let name = self
            .index
            .lookup(path)
            .map_or_else(|| file_name(path).to_string(), |n| n.name.clone());
        self.edit.start_rename(path, &name);
    }

    /// Explorer configuration.
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Current tree.
    pub fn tree(&self) -> &Tree {
        self.index.tree()
    }

    /// Path index of the current tree.
    pub fn index(&self) -> &TreeIndex {
        &self.index
    }

    /// Selection controller.
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Expansion state.
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Drag controller.
    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Edit session controller.
    pub fn edit(&self) -> &EditSessionController {
        &self.edit
    }

    /// Context menu controller.
    pub fn menu(&self) -> &ContextMenuController {
        &self.menu
    }

    /// Backend collaborator.
    pub fn backend(&self) -> &B {
        self.dispatcher.backend()
    }

    /// Handle to the liveness flag, for async work that must outlive a
    /// borrow of the explorer.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Returns whether key events are currently subscribed.
    pub fn keys_subscribed(&self) -> bool {
        self.keys.is_some()
    }

    /// Id of the live key subscription, used by the host to route presses.
    pub fn key_subscription(&self) -> Option<SubscriptionId> {
        self.keys.as_ref().map(|(_, id)| *id)
    }
}

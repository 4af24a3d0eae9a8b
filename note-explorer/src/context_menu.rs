use crate::selection::SelectionController;

/// Action offered by the context menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuAction {
    /// Start a file create session.
    NewFile,
    /// Start a directory create session.
    NewFolder,
    /// Start a rename session on the target.
    Rename,
    /// Delete the target (or the selection containing it).
    Delete,
}

/// One rendered menu entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    /// Action triggered by the entry.
    pub action: MenuAction,
    /// Display label.
    pub label: String,
}

impl MenuItem {
    fn new(action: MenuAction, label: impl Into<String>) -> Self {
        Self {
            action,
            label: label.into(),
        }
    }
}

/// Open context menu.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenuState {
    /// Screen position of the pointer.
    pub position: [f32; 2],
    /// Node the menu was opened on; `None` for the root area.
    pub target: Option<String>,
    /// Whether `target` is a directory.
    pub is_directory_target: bool,
    /// Entries in display order.
    pub items: Vec<MenuItem>,
}

/// Opens and closes the context menu.
#[derive(Clone, Debug, Default)]
pub struct ContextMenuController {
    state: Option<ContextMenuState>,
}

impl ContextMenuController {
    /// Opens the menu at `position`.
    ///
    /// Opening on the root area clears the selection. Opening on a node keeps
    /// the selection when the node already belongs to it, otherwise the node
    /// becomes the only selection. The delete label carries the count when it
    /// will act on more than one path.
    pub fn open_at(
        &mut self,
        position: [f32; 2],
        target: Option<&str>,
        is_directory: bool,
        selection: &mut SelectionController,
    ) -> &ContextMenuState {
        let mut items = vec![
            MenuItem::new(MenuAction::NewFile, "New File"),
            MenuItem::new(MenuAction::NewFolder, "New Folder"),
        ];
        match target {
            None => selection.clear(),
            Some(path) => {
                selection.context_menu_target(path);
                items.push(MenuItem::new(MenuAction::Rename, "Rename"));
                let group = selection.len();
                let label = if selection.contains(path) && group > 1 {
                    format!("Delete ({group})")
                } else {
                    "Delete".to_string()
                };
                items.push(MenuItem::new(MenuAction::Delete, label));
            }
        }
        self.state.insert(ContextMenuState {
            position,
            target: target.map(str::to_string),
            is_directory_target: target.is_some() && is_directory,
            items,
        })
    }

    /// Closes the menu.
    pub fn close(&mut self) {
        self.state = None;
    }

    /// Currently open menu.
    pub fn state(&self) -> Option<&ContextMenuState> {
        self.state.as_ref()
    }

    /// Returns whether the menu is open.
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }
}

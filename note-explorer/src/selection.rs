use std::time::{Duration, Instant};

use indexmap::IndexSet;

use crate::core::Modifiers;
use crate::tree::TreeIndex;

/// Request to open a file in the editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenIntent {
    /// File to open.
    pub path: String,
    /// Open in a new tab (second click on the same file within the threshold).
    pub new_tab: bool,
}

/// Result of a click on a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClickOutcome {
    /// The clicked directory's expansion must be flipped.
    pub toggle_expansion: bool,
    /// A file should be opened.
    pub open: Option<OpenIntent>,
}

/// Owns the selection set and interprets click gestures.
///
/// Selection order is insertion order; that order is the iteration order of
/// every group action built from the selection. Entries are reconciled
/// against the tree on every refresh through [`SelectionController::retain_existing`].
#[derive(Clone, Debug)]
pub struct SelectionController {
    selected: IndexSet<String>,
    last_click: Option<(String, Instant)>,
    double_click: Duration,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

impl SelectionController {
    /// Creates an empty selection using `double_click` as the new-tab threshold.
    pub fn new(double_click: Duration) -> Self {
        Self {
            selected: IndexSet::new(),
            last_click: None,
            double_click,
        }
    }

    /// Handles a click on a node, timestamped now.
    pub fn click(&mut self, path: &str, is_directory: bool, modifiers: Modifiers) -> ClickOutcome {
        self.click_at(path, is_directory, modifiers, Instant::now())
    }

    /// Handles a click on a node at an explicit instant.
    ///
    /// Directories always request an expansion flip. With the multi-select
    /// modifier the path's membership is toggled and nothing is opened;
    /// otherwise the selection collapses to the path and files are opened.
    pub fn click_at(
        &mut self,
        path: &str,
        is_directory: bool,
        modifiers: Modifiers,
        at: Instant,
    ) -> ClickOutcome {
        let repeated = self.last_click.as_ref().is_some_and(|(last, when)| {
            last == path && at.saturating_duration_since(*when) < self.double_click
        });
        self.last_click = Some((path.to_string(), at));

        if modifiers.multi_select() {
            self.toggle(path);
        } else {
            self.select_only(path);
        }

        if is_directory {
            return ClickOutcome {
                toggle_expansion: true,
                open: None,
            };
        }

        if modifiers.multi_select() {
            return ClickOutcome::default();
        }

        ClickOutcome {
            toggle_expansion: false,
            open: Some(OpenIntent {
                path: path.to_string(),
                new_tab: repeated,
            }),
        }
    }

    /// Adjusts selection for a right-click on `path`.
    ///
    /// An already-selected path keeps the whole selection so a following
    /// group action covers it; any other path becomes the only selection.
    pub fn context_menu_target(&mut self, path: &str) {
        if !self.selected.contains(path) {
            self.select_only(path);
        }
    }

    /// Clears selection after a click on empty content area.
    pub fn clear_on_background_click(&mut self) {
        self.clear();
    }

    /// Replaces the selection with `path`.
    pub fn select_only(&mut self, path: &str) {
        self.selected.clear();
        self.selected.insert(path.to_string());
    }

    /// Flips membership of `path`.
    pub fn toggle(&mut self, path: &str) {
        if !self.selected.shift_remove(path) {
            self.selected.insert(path.to_string());
        }
    }

    /// Empties the selection.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drops selected paths that `index` no longer contains, keeping the order
    /// of the survivors. Returns how many entries were pruned.
    pub fn retain_existing(&mut self, index: &TreeIndex) -> usize {
        let before = self.selected.len();
        self.selected.retain(|path| index.contains(path));
        before - self.selected.len()
    }

    /// Returns whether `path` is selected.
    pub fn contains(&self, path: &str) -> bool {
        self.selected.contains(path)
    }

    /// Number of selected paths.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected paths in selection order.
    pub fn paths(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }
}

use indexmap::IndexSet;

type ChangeListener = Box<dyn FnMut(&[String])>;

/// Set of expanded directory paths plus the persistence listener.
///
/// The listener receives the full expanded path list after every change; it
/// is not batched or debounced.
#[derive(Default)]
pub struct ExpansionState {
    expanded: IndexSet<String>,
    on_change: Option<ChangeListener>,
}

impl std::fmt::Debug for ExpansionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpansionState")
            .field("expanded", &self.expanded)
            .field("has_listener", &self.on_change.is_some())
            .finish()
    }
}

impl ExpansionState {
    /// Creates a state with `paths` already expanded. The listener is not notified.
    pub fn with_expanded<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expanded: paths.into_iter().map(Into::into).collect(),
            on_change: None,
        }
    }

    /// Installs the listener fired on every change of the expanded set.
    pub fn set_on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&[String]) + 'static,
    {
        self.on_change = Some(Box::new(listener));
    }

    /// Returns whether `path` is expanded.
    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    /// Expanded paths in expansion order.
    pub fn expanded_paths(&self) -> Vec<String> {
        self.expanded.iter().cloned().collect()
    }

    /// Flips `path` and returns whether it is now expanded.
    pub fn toggle(&mut self, path: &str) -> bool {
        let now_expanded = if self.expanded.shift_remove(path) {
            false
        } else {
            self.expanded.insert(path.to_string());
            true
        };
        self.notify();
        now_expanded
    }

    /// Expands `path`; returns `false` when it already was.
    pub fn expand(&mut self, path: &str) -> bool {
        if !self.expanded.insert(path.to_string()) {
            return false;
        }
        self.notify();
        true
    }

    /// Collapses `path`; returns `false` when it already was.
    pub fn collapse(&mut self, path: &str) -> bool {
        if !self.expanded.shift_remove(path) {
            return false;
        }
        self.notify();
        true
    }

    /// Expands exactly the given directories.
    pub fn expand_all(&mut self, directories: &[String]) {
        self.expanded = directories.iter().cloned().collect();
        self.notify();
    }

    /// Collapses everything.
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
        self.notify();
    }

    /// Returns whether the expanded set equals `directories`.
    ///
    /// Every directory must be expanded and no extra path may be present. An
    /// empty tree counts as fully expanded.
    pub fn is_all_expanded(&self, directories: &[String]) -> bool {
        if directories.is_empty() {
            return true;
        }
        self.expanded.len() == directories.len()
            && directories.iter().all(|d| self.expanded.contains(d))
    }

    fn notify(&mut self) {
        if let Some(listener) = self.on_change.as_mut() {
            let paths: Vec<String> = self.expanded.iter().cloned().collect();
            listener(&paths);
        }
    }
}

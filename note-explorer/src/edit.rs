use crate::core::{CreateKind, ExplorerConfig};
use crate::dispatch::Intent;
use crate::logging::explorer_trace;
use crate::tree::join_path;

/// What an inline edit session is doing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditKind {
    /// Creating a new entry inside `parent`.
    Create {
        /// Entry kind.
        kind: CreateKind,
        /// Directory the entry is created in (the root path for root).
        parent: String,
    },
    /// Renaming `target`.
    Rename {
        /// Path being renamed.
        target: String,
        /// Name at session start.
        current_name: String,
    },
}

/// The single inline create/rename session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    /// Session kind and anchor.
    pub kind: EditKind,
    /// Text currently typed into the inline field.
    pub draft: String,
}

/// Owns at most one [`EditSession`].
#[derive(Clone, Debug)]
pub struct EditSessionController {
    session: Option<EditSession>,
    root: String,
    default_file_name: String,
    default_directory_name: String,
    note_extension: String,
}

impl EditSessionController {
    /// Creates a controller using the naming rules of `config`.
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            session: None,
            root: config.root.clone(),
            default_file_name: config.default_file_name.clone(),
            default_directory_name: config.default_directory_name.clone(),
            note_extension: config.note_extension.clone(),
        }
    }

    /// Active session.
    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Returns whether a session is open.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Path of the node under rename, if any.
    pub fn renaming_path(&self) -> Option<&str> {
        match self.session.as_ref().map(|s| &s.kind) {
            Some(EditKind::Rename { target, .. }) => Some(target),
            _ => None,
        }
    }

    /// Opens a create session; `parent` defaults to the root.
    ///
    /// Replaces any session already open.
    pub fn start_create(&mut self, kind: CreateKind, parent: Option<&str>) {
        let parent = parent.unwrap_or(&self.root).to_string();
        explorer_trace!(event = "edit.start_create", ?kind, parent = %parent, "create session");
        self.session = Some(EditSession {
            kind: EditKind::Create { kind, parent },
            draft: String::new(),
        });
    }

    /// Opens a rename session on `path` whose current name is `current_name`.
    pub fn start_rename(&mut self, path: &str, current_name: &str) {
        explorer_trace!(event = "edit.start_rename", path, "rename session");
        self.session = Some(EditSession {
            kind: EditKind::Rename {
                target: path.to_string(),
                current_name: current_name.to_string(),
            },
            draft: current_name.to_string(),
        });
    }

    /// Replaces the draft text of the open session.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let Some(session) = self.session.as_mut() {
            session.draft = text.into();
        }
    }

    /// Commits the open session with its current draft (Enter or blur).
    pub fn commit(&mut self) -> Option<Intent> {
        let session = self.session.as_ref()?;
        let draft = session.draft.clone();
        if matches!(session.kind, EditKind::Create { .. }) {
            self.commit_create(&draft)
        } else {
            self.commit_rename(&draft)
        }
    }

    /// Closes a create session and returns the create intent for `raw_name`.
    ///
    /// An empty name falls back to the kind's default; file names without the
    /// note extension get it appended. Returns `None` (leaving the session
    /// untouched) when no create session is open.
    pub fn commit_create(&mut self, raw_name: &str) -> Option<Intent> {
        let (kind, parent) = match self.session.as_ref()?.kind {
            EditKind::Create { kind, ref parent } => (kind, parent.clone()),
            EditKind::Rename { .. } => return None,
        };
        self.session = None;

        let trimmed = raw_name.trim();
        let name = match kind {
            CreateKind::File => {
                let base = if trimmed.is_empty() {
                    self.default_file_name.as_str()
                } else {
                    trimmed
                };
                with_extension(base, &self.note_extension)
            }
            CreateKind::Directory if trimmed.is_empty() => self.default_directory_name.clone(),
            CreateKind::Directory => trimmed.to_string(),
        };
        let path = join_path(&parent, &name);
        Some(match kind {
            CreateKind::File => Intent::CreateFile { path },
            CreateKind::Directory => Intent::CreateDirectory { path },
        })
    }

    /// Closes a rename session and returns the rename intent for `raw_name`.
    ///
    /// An empty name or the unchanged current name closes the session without
    /// producing an intent.
    pub fn commit_rename(&mut self, raw_name: &str) -> Option<Intent> {
        let (target, current_name) = match &self.session.as_ref()?.kind {
            EditKind::Rename {
                target,
                current_name,
            } => (target.clone(), current_name.clone()),
            EditKind::Create { .. } => return None,
        };
        self.session = None;

        let new_name = raw_name.trim();
        if new_name.is_empty() || new_name == current_name {
            explorer_trace!(event = "edit.rename_noop", path = %target, "rename discarded");
            return None;
        }
        Some(Intent::Rename {
            path: target,
            new_name: new_name.to_string(),
        })
    }

    /// Discards the open session (Escape). Never produces an intent.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}

fn with_extension(name: &str, ext: &str) -> String {
    if ext.is_empty() || has_suffix_ignore_ascii_case(name, ext) {
        name.to_string()
    } else {
        format!("{name}{ext}")
    }
}

fn has_suffix_ignore_ascii_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.as_bytes()[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> EditSessionController {
        EditSessionController::new(&ExplorerConfig::new("/notes"))
    }

    fn create_path(intent: Option<Intent>) -> String {
        match intent {
            Some(Intent::CreateFile { path }) | Some(Intent::CreateDirectory { path }) => path,
            other => panic!("expected a create intent, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_name_uses_default_note_name() {
        let mut edit = controller();
        edit.start_create(CreateKind::File, Some("/notes"));
        assert_eq!(
            edit.commit_create("   "),
            Some(Intent::CreateFile {
                path: "/notes/New note.md".into()
            })
        );
        assert!(!edit.is_active());
    }

    #[test]
    fn file_names_get_the_note_extension_once() {
        let mut edit = controller();
        edit.start_create(CreateKind::File, Some("/notes/journal"));
        assert_eq!(create_path(edit.commit_create(" ideas ")), "/notes/journal/ideas.md");

        edit.start_create(CreateKind::File, None);
        assert_eq!(create_path(edit.commit_create("todo.md")), "/notes/todo.md");

        edit.start_create(CreateKind::File, None);
        assert_eq!(create_path(edit.commit_create("LOUD.MD")), "/notes/LOUD.MD");
    }

    #[test]
    fn directories_use_their_own_default_and_no_extension() {
        let mut edit = controller();
        edit.start_create(CreateKind::Directory, None);
        assert_eq!(
            edit.commit_create(""),
            Some(Intent::CreateDirectory {
                path: "/notes/New directory".into()
            })
        );

        edit.start_create(CreateKind::Directory, Some("/notes/a"));
        assert_eq!(create_path(edit.commit_create("b")), "/notes/a/b");
    }

    #[test]
    fn rename_to_same_or_empty_name_is_a_noop() {
        let mut edit = controller();
        edit.start_rename("/notes/a.md", "a.md");
        assert_eq!(edit.commit_rename(" a.md "), None);
        assert!(!edit.is_active());

        edit.start_rename("/notes/a.md", "a.md");
        assert_eq!(edit.commit_rename(""), None);
        assert!(!edit.is_active());
    }

    #[test]
    fn rename_to_new_name_yields_intent() {
        let mut edit = controller();
        edit.start_rename("/notes/a.md", "a.md");
        assert_eq!(edit.renaming_path(), Some("/notes/a.md"));
        assert_eq!(
            edit.commit_rename("b.md"),
            Some(Intent::Rename {
                path: "/notes/a.md".into(),
                new_name: "b.md".into()
            })
        );
    }

    #[test]
    fn commit_uses_draft_and_routes_by_kind() {
        let mut edit = controller();
        edit.start_rename("/notes/a.md", "a.md");
        assert_eq!(edit.session().unwrap().draft, "a.md");
        edit.set_draft("c.md");
        assert!(matches!(edit.commit(), Some(Intent::Rename { .. })));

        edit.start_create(CreateKind::File, None);
        edit.set_draft("d");
        assert_eq!(create_path(edit.commit()), "/notes/d.md");
    }

    #[test]
    fn cancel_discards_without_intent_and_mismatched_commit_keeps_session() {
        let mut edit = controller();
        edit.start_create(CreateKind::File, None);
        assert_eq!(edit.commit_rename("x"), None);
        assert!(edit.is_active());
        edit.cancel();
        assert!(edit.session().is_none());
        assert_eq!(edit.commit(), None);
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use note_explorer::{
    Backend, BackendCall, BackendError, ConfirmWith, CreateKind, DeleteItem, DragPayload,
    DropEffect, Explorer, ExplorerConfig, ExplorerEvent, ExplorerOutcome, Intent, Key, Lifecycle,
    MemoryBackend, MenuAction, Modifiers, Tree, WindowKeys,
};
use pollster::block_on;
use pretty_assertions::assert_eq;

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn notes() -> MemoryBackend {
    MemoryBackend::new("/notes")
        .with_file("/notes/a.md")
        .with_directory("/notes/x")
        .with_file("/notes/x/b.md")
        .with_file("/notes/x/c.md")
        .with_directory("/notes/x/sub")
        .with_directory("/notes/y")
        .with_file("/notes/y/d.md")
        .with_directory("/notes/z")
}

fn mount(mem: &MemoryBackend) -> Explorer<MemoryBackend> {
    let mut explorer = Explorer::new(mem.clone(), ExplorerConfig::new("/notes"));
    block_on(explorer.mount()).unwrap();
    mem.clear_calls();
    explorer
}

fn click(
    explorer: &mut Explorer<MemoryBackend>,
    path: &str,
    modifiers: Modifiers,
) -> ExplorerOutcome {
    explorer.handle_event(ExplorerEvent::Click {
        path: path.into(),
        modifiers,
    })
}

fn select_group(explorer: &mut Explorer<MemoryBackend>) {
    for p in ["/notes/a.md", "/notes/x/b.md", "/notes/x/c.md"] {
        click(explorer, p, Modifiers::CTRL);
    }
}

fn mutations(mem: &MemoryBackend) -> Vec<BackendCall> {
    mem.calls()
        .into_iter()
        .filter(|c| !matches!(c, BackendCall::List { .. }))
        .collect()
}

fn moves(sources: &[&str], destination: &str) -> Vec<BackendCall> {
    sources
        .iter()
        .map(|s| BackendCall::Move {
            source: s.to_string(),
            destination: destination.to_string(),
        })
        .collect()
}

#[test]
fn directory_click_toggles_expansion_exactly_once_for_any_modifier() {
    let mem = notes();
    let mut explorer = mount(&mem);
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    explorer.on_expanded_dirs_change(move |paths| sink.borrow_mut().push(paths.to_vec()));

    click(&mut explorer, "/notes/x", Modifiers::NONE);
    assert!(explorer.expansion().is_expanded("/notes/x"));
    click(&mut explorer, "/notes/x", Modifiers::CTRL);
    assert!(!explorer.expansion().is_expanded("/notes/x"));
    click(
        &mut explorer,
        "/notes/x",
        Modifiers {
            ctrl: false,
            meta: true,
        },
    );
    assert!(explorer.expansion().is_expanded("/notes/x"));
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn second_quick_click_on_a_file_opens_a_new_tab() {
    let mem = notes();
    let mut explorer = mount(&mem);
    let first = click(&mut explorer, "/notes/a.md", Modifiers::NONE);
    let second = click(&mut explorer, "/notes/a.md", Modifiers::NONE);
    match (first, second) {
        (ExplorerOutcome::Open(first), ExplorerOutcome::Open(second)) => {
            assert!(!first.new_tab);
            assert!(second.new_tab);
        }
        other => panic!("expected two opens, got {other:?}"),
    }
}

#[test]
fn group_drag_without_batch_moves_issues_ordered_single_moves() {
    let mem = notes();
    let mut explorer = mount(&mem);
    select_group(&mut explorer);

    let payload = match explorer.handle_event(ExplorerEvent::DragStart {
        path: "/notes/x/b.md".into(),
    }) {
        ExplorerOutcome::DragStarted(payload) => payload,
        other => panic!("expected drag start, got {other:?}"),
    };
    assert_eq!(
        payload.paths,
        strings(&["/notes/a.md", "/notes/x/b.md", "/notes/x/c.md"])
    );
    assert_eq!(
        explorer.handle_event(ExplorerEvent::DragOver {
            target: "/notes/z".into()
        }),
        ExplorerOutcome::DropEffect(DropEffect::Move)
    );

    block_on(explorer.process(ExplorerEvent::Drop {
        target: "/notes/z".into(),
        payload,
    }));
    assert_eq!(
        mutations(&mem),
        moves(&["/notes/a.md", "/notes/x/b.md", "/notes/x/c.md"], "/notes/z")
    );
    assert!(explorer.index().contains("/notes/z/b.md"));
    assert!(!explorer.drag().is_dragging());
}

#[test]
fn group_drag_with_batch_moves_issues_one_move_many() {
    let mem = notes().with_batch_moves();
    let mut explorer = mount(&mem);
    select_group(&mut explorer);
    let ExplorerOutcome::DragStarted(payload) = explorer.handle_event(ExplorerEvent::DragStart {
        path: "/notes/x/b.md".into(),
    }) else {
        panic!("drag did not start");
    };

    block_on(explorer.process(ExplorerEvent::Drop {
        target: "/notes/z".into(),
        payload,
    }));
    assert_eq!(
        mutations(&mem),
        vec![BackendCall::MoveMany {
            sources: strings(&["/notes/a.md", "/notes/x/b.md", "/notes/x/c.md"]),
            destination: "/notes/z".into(),
        }]
    );
}

#[test]
fn drop_on_self_or_descendant_never_moves() {
    let mem = notes();
    let mut explorer = mount(&mem);
    let ExplorerOutcome::DragStarted(payload) = explorer.handle_event(ExplorerEvent::DragStart {
        path: "/notes/x".into(),
    }) else {
        panic!("drag did not start");
    };

    for target in ["/notes/x", "/notes/x/sub"] {
        let out = block_on(explorer.process(ExplorerEvent::Drop {
            target: target.into(),
            payload: payload.clone(),
        }));
        assert_eq!(out, ExplorerOutcome::None);
    }
    assert!(mem.calls().is_empty());
}

#[test]
fn drop_on_a_file_is_discarded() {
    let mem = notes();
    let mut explorer = mount(&mem);
    assert_eq!(
        explorer.handle_event(ExplorerEvent::DragOver {
            target: "/notes/a.md".into()
        }),
        ExplorerOutcome::DropEffect(DropEffect::NotAllowed)
    );
    let out = explorer.handle_event(ExplorerEvent::Drop {
        target: "/notes/a.md".into(),
        payload: DragPayload::plain_text("/notes/y/d.md"),
    });
    assert_eq!(out, ExplorerOutcome::None);
}

#[test]
fn root_drop_moves_nested_sources_to_root() {
    let mem = notes();
    let mut explorer = mount(&mem);
    let out = block_on(explorer.process(ExplorerEvent::DropOnRoot {
        payload: DragPayload::from_paths(strings(&["/notes/a.md", "/notes/y/d.md"])),
    }));
    assert_eq!(
        out,
        ExplorerOutcome::Dispatch(Intent::Move {
            sources: strings(&["/notes/y/d.md"]),
            destination: "/notes".into(),
        })
    );
    assert_eq!(mutations(&mem), moves(&["/notes/y/d.md"], "/notes"));
    assert!(explorer.index().contains("/notes/d.md"));
}

#[test]
fn empty_create_name_creates_default_note() {
    let mem = notes();
    let mut explorer = mount(&mem);
    explorer.handle_event(ExplorerEvent::StartCreate {
        kind: CreateKind::File,
        parent: Some("/notes".into()),
    });
    explorer.handle_event(ExplorerEvent::EditInput("   ".into()));
    block_on(explorer.process(ExplorerEvent::CommitEdit));

    assert_eq!(
        mutations(&mem),
        vec![BackendCall::CreateFile("/notes/New note.md".into())]
    );
    assert!(explorer.index().contains("/notes/New note.md"));
    assert!(!explorer.edit().is_active());
}

#[test]
fn rename_to_the_current_name_makes_no_backend_call() {
    let mem = notes();
    let mut explorer = mount(&mem);
    explorer.handle_event(ExplorerEvent::StartRename {
        path: "/notes/x/b.md".into(),
    });
    assert_eq!(explorer.edit().renaming_path(), Some("/notes/x/b.md"));
    let out = block_on(explorer.process(ExplorerEvent::CommitEdit));
    assert_eq!(out, ExplorerOutcome::None);
    assert!(mem.calls().is_empty());
}

#[test]
fn rename_commits_and_refreshes() {
    let mem = notes();
    let mut explorer = mount(&mem);
    explorer.handle_event(ExplorerEvent::StartRename {
        path: "/notes/x/b.md".into(),
    });
    explorer.handle_event(ExplorerEvent::EditInput("renamed.md".into()));
    block_on(explorer.process(ExplorerEvent::CommitEdit));
    assert!(explorer.index().contains("/notes/x/renamed.md"));
    assert!(!explorer.index().contains("/notes/x/b.md"));
}

#[test]
fn context_menu_on_group_member_keeps_selection_and_counts_it() {
    let mem = notes();
    let mut explorer = mount(&mem);
    select_group(&mut explorer);

    explorer.handle_event(ExplorerEvent::ContextMenu {
        position: [10.0, 20.0],
        target: Some("/notes/x/b.md".into()),
    });
    let labels: Vec<String> = explorer
        .menu()
        .state()
        .unwrap()
        .items
        .iter()
        .map(|i| i.label.clone())
        .collect();
    assert_eq!(labels.last().map(String::as_str), Some("Delete (3)"));
    assert_eq!(explorer.selection().len(), 3);

    explorer.handle_event(ExplorerEvent::ContextMenu {
        position: [10.0, 20.0],
        target: Some("/notes/y/d.md".into()),
    });
    assert_eq!(explorer.selection().paths(), strings(&["/notes/y/d.md"]));
}

#[test]
fn menu_delete_on_group_member_deletes_whole_selection() {
    let mem = notes();
    let mut explorer = mount(&mem);
    select_group(&mut explorer);
    explorer.handle_event(ExplorerEvent::ContextMenu {
        position: [0.0, 0.0],
        target: Some("/notes/x/c.md".into()),
    });
    block_on(explorer.process(ExplorerEvent::MenuAction(MenuAction::Delete)));

    assert_eq!(
        mutations(&mem),
        vec![
            BackendCall::Delete {
                path: "/notes/a.md".into(),
                is_directory: false
            },
            BackendCall::Delete {
                path: "/notes/x/b.md".into(),
                is_directory: false
            },
            BackendCall::Delete {
                path: "/notes/x/c.md".into(),
                is_directory: false
            },
        ]
    );
    assert!(!explorer.menu().is_open());
}

#[test]
fn menu_new_file_on_a_file_creates_next_to_it() {
    let mem = notes();
    let mut explorer = mount(&mem);
    explorer.handle_event(ExplorerEvent::ContextMenu {
        position: [0.0, 0.0],
        target: Some("/notes/x/b.md".into()),
    });
    explorer.handle_event(ExplorerEvent::MenuAction(MenuAction::NewFile));
    assert!(explorer.expansion().is_expanded("/notes/x"));
    explorer.handle_event(ExplorerEvent::EditInput("idea".into()));
    let out = block_on(explorer.process(ExplorerEvent::CommitEdit));
    assert_eq!(
        out,
        ExplorerOutcome::Dispatch(Intent::CreateFile {
            path: "/notes/x/idea.md".into()
        })
    );
    assert!(explorer.index().contains("/notes/x/idea.md"));
}

#[test]
fn menu_new_folder_on_root_area_creates_at_root() {
    let mem = notes();
    let mut explorer = mount(&mem);
    click(&mut explorer, "/notes/a.md", Modifiers::NONE);
    explorer.handle_event(ExplorerEvent::ContextMenu {
        position: [0.0, 0.0],
        target: None,
    });
    assert!(explorer.selection().is_empty());
    explorer.handle_event(ExplorerEvent::MenuAction(MenuAction::NewFolder));
    block_on(explorer.process(ExplorerEvent::CommitEdit));
    assert_eq!(
        mutations(&mem),
        vec![BackendCall::CreateDirectory("/notes/New directory".into())]
    );
}

#[test]
fn delete_key_while_editing_deletes_nothing() {
    let mem = notes();
    let mut explorer = mount(&mem);
    explorer.subscribe_keys(Rc::new(WindowKeys::default()));
    click(&mut explorer, "/notes/a.md", Modifiers::NONE);
    explorer.handle_event(ExplorerEvent::StartRename {
        path: "/notes/a.md".into(),
    });

    let out = block_on(explorer.process(ExplorerEvent::Key(Key::Delete)));
    assert_eq!(out, ExplorerOutcome::None);
    assert!(mem.calls().is_empty());

    explorer.handle_event(ExplorerEvent::Key(Key::Escape));
    assert!(!explorer.edit().is_active());
    block_on(explorer.process(ExplorerEvent::Key(Key::Delete)));
    assert_eq!(
        mutations(&mem),
        vec![BackendCall::Delete {
            path: "/notes/a.md".into(),
            is_directory: false
        }]
    );
}

#[test]
fn delete_key_uses_batch_delete_and_confirmation() {
    let mem = notes().with_batch_deletes();
    let asked = Rc::new(RefCell::new(Vec::new()));
    let seen = asked.clone();
    let mut explorer = Explorer::new(mem.clone(), ExplorerConfig::new("/notes")).with_confirmation(
        ConfirmWith(move |items: &[DeleteItem]| {
            seen.borrow_mut().push(items.len());
            true
        }),
    );
    block_on(explorer.mount()).unwrap();
    mem.clear_calls();
    explorer.subscribe_keys(Rc::new(WindowKeys::default()));
    explorer.handle_event(ExplorerEvent::Click {
        path: "/notes/a.md".into(),
        modifiers: Modifiers::CTRL,
    });
    explorer.handle_event(ExplorerEvent::Click {
        path: "/notes/y".into(),
        modifiers: Modifiers::CTRL,
    });

    block_on(explorer.process(ExplorerEvent::Key(Key::Delete)));
    assert_eq!(*asked.borrow(), vec![2]);
    assert_eq!(
        mutations(&mem),
        vec![BackendCall::DeleteMany(vec![
            DeleteItem::new("/notes/a.md", false),
            DeleteItem::new("/notes/y", true),
        ])]
    );
    assert!(!explorer.index().contains("/notes/y/d.md"));
}

#[test]
fn expand_all_and_collapse_all_follow_the_tree() {
    let mem = notes();
    let mut explorer = mount(&mem);
    explorer.handle_event(ExplorerEvent::ExpandAll);
    let dirs = explorer.index().all_directory_paths().to_vec();
    assert_eq!(dirs, strings(&["/notes/x", "/notes/x/sub", "/notes/y", "/notes/z"]));
    assert!(explorer.expansion().is_all_expanded(&dirs));

    explorer.handle_event(ExplorerEvent::CollapseAll);
    assert!(explorer.expansion().expanded_paths().is_empty());
}

struct TearsDownOnList {
    inner: MemoryBackend,
    lifecycle: RefCell<Option<Lifecycle>>,
}

impl Backend for TearsDownOnList {
    async fn list_directory(&self, root: &str, recursive: bool) -> Result<Tree, BackendError> {
        if let Some(lifecycle) = self.lifecycle.borrow().as_ref() {
            lifecycle.teardown();
        }
        self.inner.list_directory(root, recursive).await
    }

    async fn create_file(&self, path: &str) -> Result<(), BackendError> {
        self.inner.create_file(path).await
    }

    async fn create_directory(&self, path: &str) -> Result<(), BackendError> {
        self.inner.create_directory(path).await
    }

    async fn rename(&self, old_path: &str, new_name: &str) -> Result<(), BackendError> {
        self.inner.rename(old_path, new_name).await
    }

    async fn delete(&self, path: &str, is_directory: bool) -> Result<(), BackendError> {
        self.inner.delete(path, is_directory).await
    }

    async fn move_path(&self, source: &str, destination: &str) -> Result<(), BackendError> {
        self.inner.move_path(source, destination).await
    }
}

#[test]
fn listing_resolved_after_teardown_is_discarded() {
    let mem = notes();
    let backend = TearsDownOnList {
        inner: mem.clone(),
        lifecycle: RefCell::new(None),
    };
    let mut explorer = Explorer::new(backend, ExplorerConfig::new("/notes"));
    block_on(explorer.mount()).unwrap();
    let before = explorer.tree().clone();

    *explorer.backend().lifecycle.borrow_mut() = Some(explorer.lifecycle());
    block_on(explorer.process(ExplorerEvent::DropOnRoot {
        payload: DragPayload::plain_text("/notes/x/b.md"),
    }));

    assert!(mem.exists("/notes/b.md"));
    assert_eq!(explorer.tree(), &before);
    assert!(!explorer.lifecycle().is_alive());
    assert_eq!(
        explorer.handle_event(ExplorerEvent::BackgroundClick),
        ExplorerOutcome::None
    );
}

#[test]
fn refresh_prunes_selection_of_moved_paths() {
    let mem = notes();
    let mut explorer = mount(&mem);
    explorer.subscribe_keys(Rc::new(WindowKeys::default()));
    click(&mut explorer, "/notes/a.md", Modifiers::CTRL);
    click(&mut explorer, "/notes/x/b.md", Modifiers::CTRL);
    click(&mut explorer, "/notes/y/d.md", Modifiers::CTRL);
    let ExplorerOutcome::DragStarted(payload) = explorer.handle_event(ExplorerEvent::DragStart {
        path: "/notes/a.md".into(),
    }) else {
        panic!("drag did not start");
    };
    let payload = DragPayload::from_paths(payload.paths[..2].to_vec());

    block_on(explorer.process(ExplorerEvent::Drop {
        target: "/notes/z".into(),
        payload,
    }));
    assert_eq!(explorer.selection().paths(), strings(&["/notes/y/d.md"]));

    mem.clear_calls();
    block_on(explorer.process(ExplorerEvent::Key(Key::Delete)));
    assert_eq!(
        mutations(&mem),
        vec![BackendCall::Delete {
            path: "/notes/y/d.md".into(),
            is_directory: false
        }]
    );
    assert!(explorer.selection().is_empty());
    assert_eq!(
        block_on(explorer.process(ExplorerEvent::Key(Key::Delete))),
        ExplorerOutcome::None
    );
}

#[test]
fn failed_create_closes_session_without_retry_or_refresh() {
    let mem = notes().fail_on("/notes/x/idea.md");
    let mut explorer = mount(&mem);
    click(&mut explorer, "/notes/a.md", Modifiers::NONE);
    explorer.handle_event(ExplorerEvent::StartCreate {
        kind: CreateKind::File,
        parent: Some("/notes/x".into()),
    });
    explorer.handle_event(ExplorerEvent::EditInput("idea".into()));
    block_on(explorer.process(ExplorerEvent::CommitEdit));

    assert_eq!(
        mem.calls(),
        vec![BackendCall::CreateFile("/notes/x/idea.md".into())]
    );
    assert!(!explorer.edit().is_active());
    assert!(!explorer.index().contains("/notes/x/idea.md"));
    assert_eq!(explorer.selection().paths(), strings(&["/notes/a.md"]));
}

#[test]
fn rename_onto_a_sibling_conflicts_and_keeps_the_tree() {
    let mem = notes();
    let mut explorer = mount(&mem);
    click(&mut explorer, "/notes/x/b.md", Modifiers::NONE);
    explorer.handle_event(ExplorerEvent::StartRename {
        path: "/notes/x/b.md".into(),
    });
    explorer.handle_event(ExplorerEvent::EditInput("c.md".into()));
    block_on(explorer.process(ExplorerEvent::CommitEdit));

    assert_eq!(
        mem.calls(),
        vec![BackendCall::Rename {
            path: "/notes/x/b.md".into(),
            new_name: "c.md".into()
        }]
    );
    assert!(!explorer.edit().is_active());
    assert!(explorer.index().contains("/notes/x/b.md"));
    assert_eq!(explorer.selection().paths(), strings(&["/notes/x/b.md"]));
}

#[test]
fn sequential_delete_continues_past_a_failing_item() {
    let mem = notes().fail_on("/notes/x/b.md");
    let mut explorer = mount(&mem);
    explorer.subscribe_keys(Rc::new(WindowKeys::default()));
    select_group(&mut explorer);

    block_on(explorer.process(ExplorerEvent::Key(Key::Delete)));
    assert_eq!(
        mutations(&mem),
        vec![
            BackendCall::Delete {
                path: "/notes/a.md".into(),
                is_directory: false
            },
            BackendCall::Delete {
                path: "/notes/x/b.md".into(),
                is_directory: false
            },
            BackendCall::Delete {
                path: "/notes/x/c.md".into(),
                is_directory: false
            },
        ]
    );
    assert!(matches!(mem.calls().last(), Some(BackendCall::List { .. })));
    assert!(!explorer.index().contains("/notes/a.md"));
    assert!(explorer.index().contains("/notes/x/b.md"));
    assert!(!explorer.index().contains("/notes/x/c.md"));
    assert_eq!(explorer.selection().paths(), strings(&["/notes/x/b.md"]));
}

#[test]
fn key_presses_reach_only_live_subscriptions() {
    let keys = WindowKeys::default();
    let source: Rc<dyn note_explorer::KeySource> = Rc::new(keys.clone());
    let live_mem = notes();
    let mut live = mount(&live_mem);
    live.subscribe_keys(source.clone());
    let gone_mem = notes();
    let mut gone = mount(&gone_mem);
    gone.subscribe_keys(source);
    assert_eq!(keys.len(), 2);

    click(&mut live, "/notes/a.md", Modifiers::NONE);
    click(&mut gone, "/notes/a.md", Modifiers::NONE);
    gone.teardown();
    assert_eq!(gone.key_subscription(), None);

    let targets = keys.press(Key::Delete);
    assert_eq!(targets, live.key_subscription().into_iter().collect::<Vec<_>>());
    for explorer in [&mut live, &mut gone] {
        if explorer
            .key_subscription()
            .is_some_and(|id| targets.contains(&id))
        {
            block_on(explorer.process(ExplorerEvent::Key(Key::Delete)));
        }
    }
    assert!(!live_mem.exists("/notes/a.md"));
    assert!(gone_mem.exists("/notes/a.md"));
}

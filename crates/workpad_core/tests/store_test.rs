//! Integration tests for the workspace store against in-memory collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_lite::future::block_on;

use workpad_core::datastore::{Datastore, LocalDatastore, MemoryDatastore};
use workpad_core::error::WorkpadError;
use workpad_core::events::StoreEvent;
use workpad_core::fs::{FileSystem, InMemoryFileSystem};
use workpad_core::identity::{IdentityProvider, LocalIdentity};
use workpad_core::model::{ContentKind, NewContentItem, PageUpdate, User};
use workpad_core::share::{ShareLinks, load_shared_page, load_shared_workspace};
use workpad_core::store::WorkspaceStore;

const ORIGIN: &str = "https://app.workpad.dev";

fn user() -> User {
    User {
        id: "u1".to_string(),
        email: "ada@example.com".to_string(),
    }
}

fn store_with(datastore: Arc<MemoryDatastore>) -> WorkspaceStore {
    let store = WorkspaceStore::new(datastore, ShareLinks::new(ORIGIN));
    block_on(store.set_identity(Some(user())));
    store
}

fn store() -> (WorkspaceStore, Arc<MemoryDatastore>) {
    let datastore = Arc::new(MemoryDatastore::new());
    (store_with(Arc::clone(&datastore)), datastore)
}

#[test]
fn create_workspace_postconditions() {
    let (store, datastore) = store();

    let id = block_on(store.create_workspace("Notes")).unwrap();

    let workspaces = store.workspaces();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].id, id);
    assert_eq!(workspaces[0].name, "Notes");
    assert!(workspaces[0].pages.is_empty());
    assert_eq!(store.current_workspace_id(), Some(id.clone()));

    // The remote insert went through as well
    assert_eq!(datastore.workspace_count(), 1);

    // Identifiers are never reused
    let other = block_on(store.create_workspace("Scratch")).unwrap();
    assert_ne!(id, other);
}

#[test]
fn delete_page_never_leaves_dangling_selection() {
    let (store, _) = store();
    let ws = block_on(store.create_workspace("Notes")).unwrap();

    let p1 = block_on(store.create_page(&ws, "First")).unwrap();
    let p2 = block_on(store.create_page(&ws, "Second")).unwrap();
    // Creating a page auto-selects it
    assert_eq!(
        store.workspace(&ws).unwrap().current_page_id,
        Some(p2.clone())
    );

    // Deleting the selected page falls back to a remaining page
    block_on(store.delete_page(&ws, &p2)).unwrap();
    let workspace = store.workspace(&ws).unwrap();
    assert_eq!(workspace.pages.len(), 1);
    assert_eq!(workspace.current_page_id, Some(p1.clone()));

    // Deleting the last page clears the selection
    block_on(store.delete_page(&ws, &p1)).unwrap();
    let workspace = store.workspace(&ws).unwrap();
    assert!(workspace.pages.is_empty());
    assert_eq!(workspace.current_page_id, None);
}

#[test]
fn mutating_unknown_ids_is_a_silent_noop() {
    let (store, datastore) = store();
    let ws = block_on(store.create_workspace("Notes")).unwrap();

    block_on(store.rename_workspace("missing", "New Name")).unwrap();
    block_on(store.delete_workspace("missing")).unwrap();
    block_on(store.delete_page(&ws, "missing")).unwrap();
    block_on(store.update_page(&ws, "missing", PageUpdate::new().body("x"))).unwrap();
    block_on(store.remove_attachment(&ws, "missing", "missing")).unwrap();

    let workspaces = store.workspaces();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].name, "Notes");
    assert_eq!(datastore.workspace_count(), 1);
}

#[test]
fn update_page_touches_only_supplied_fields() {
    let (store, _) = store();
    let ws = block_on(store.create_workspace("Notes")).unwrap();
    let page = block_on(store.create_page(&ws, "Todo")).unwrap();
    block_on(store.update_page(&ws, &page, PageUpdate::new().body("<p>hi</p>").public(true)))
        .unwrap();

    block_on(store.update_page(&ws, &page, PageUpdate::new().title("X"))).unwrap();

    let found = store.workspace(&ws).unwrap();
    let found = found.page(&page).unwrap();
    assert_eq!(found.title, "X");
    assert_eq!(found.body, "<p>hi</p>");
    assert!(found.public);
}

#[test]
fn update_page_rejects_empty_title_before_io() {
    let (store, _) = store();
    let ws = block_on(store.create_workspace("Notes")).unwrap();
    let page = block_on(store.create_page(&ws, "Todo")).unwrap();

    assert!(matches!(
        block_on(store.update_page(&ws, &page, PageUpdate::new().title("  "))),
        Err(WorkpadError::EmptyPageTitle)
    ));
    assert_eq!(store.workspace(&ws).unwrap().page(&page).unwrap().title, "Todo");
}

#[test]
fn share_view_access_follows_visibility_toggles() {
    let (store, datastore) = store();
    let ws = block_on(store.create_workspace("Notes")).unwrap();
    let page = block_on(store.create_page(&ws, "Todo")).unwrap();

    block_on(store.set_page_visibility(&ws, &page, true)).unwrap();
    assert!(block_on(load_shared_page(&*datastore, &page))
        .unwrap()
        .is_some());

    block_on(store.set_page_visibility(&ws, &page, false)).unwrap();
    assert!(block_on(load_shared_page(&*datastore, &page))
        .unwrap()
        .is_none());

    block_on(store.set_workspace_visibility(&ws, true)).unwrap();
    let shared = block_on(load_shared_workspace(&*datastore, &ws))
        .unwrap()
        .unwrap();
    assert_eq!(shared.pages.len(), 1);
}

#[test]
fn workspace_share_link_flips_visibility_once() {
    let (store, datastore) = store();
    let ws = block_on(store.create_workspace("Notes")).unwrap();

    let url = block_on(store.workspace_share_link(&ws)).unwrap();
    assert_eq!(url, format!("{ORIGIN}/share/workspace/{ws}"));
    assert!(store.workspace(&ws).unwrap().public);
    assert!(block_on(datastore.get_public_workspace(&ws)).unwrap().is_some());
}

#[test]
fn round_trip_reload_reproduces_the_mirror() {
    let (store, datastore) = store();
    let ws = block_on(store.create_workspace("Notes")).unwrap();
    let page = block_on(store.create_page(&ws, "Todo")).unwrap();
    block_on(store.update_page(&ws, &page, PageUpdate::new().body("hello"))).unwrap();
    block_on(store.add_attachment(&ws, &page, b"pixels", "shot.png")).unwrap();

    // Fresh store over the same datastore simulates a new session
    let fresh = store_with(datastore);

    let workspaces = fresh.workspaces();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].id, ws);
    assert_eq!(workspaces[0].pages.len(), 1);
    let reloaded = &workspaces[0].pages[0];
    assert_eq!(reloaded.id, page);
    assert_eq!(reloaded.body, "hello");
    assert_eq!(reloaded.attachments.len(), 1);
    assert_eq!(reloaded.attachments[0].name, "shot.png");
}

#[test]
fn notes_todo_scenario() {
    let (store, _) = store();

    let w1 = block_on(store.create_workspace("Notes")).unwrap();
    let p1 = block_on(store.create_page(&w1, "Todo")).unwrap();

    let workspace = store.workspace(&w1).unwrap();
    assert_eq!(workspace.pages.len(), 1);
    assert_eq!(workspace.pages[0].title, "Todo");

    block_on(store.delete_page(&w1, &p1)).unwrap();
    let workspace = store.workspace(&w1).unwrap();
    assert!(workspace.pages.is_empty());
    assert_eq!(workspace.current_page_id, None);
}

#[test]
fn remote_write_failure_keeps_optimistic_state_and_notifies() {
    let (store, datastore) = store();
    let failures = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&failures);
    store.subscribe(Arc::new(move |event| {
        if matches!(event, StoreEvent::RemoteWriteFailed { .. }) {
            seen.fetch_add(1, Ordering::SeqCst);
        }
    }));

    datastore.set_fail_writes(true);

    // Workspace creation succeeds locally despite the failed insert
    let ws = block_on(store.create_workspace("Offline")).unwrap();
    assert_eq!(store.workspaces().len(), 1);
    assert_eq!(datastore.workspace_count(), 0);

    // Page creation keeps the optimistic append but returns the failure
    let result = block_on(store.create_page(&ws, "Draft"));
    assert!(result.is_err());
    assert_eq!(store.workspace(&ws).unwrap().pages.len(), 1);

    assert_eq!(failures.load(Ordering::SeqCst), 2);
}

#[test]
fn load_degrades_failed_children_to_empty() {
    let (store, datastore) = store();
    let broken = block_on(store.create_workspace("Broken")).unwrap();
    block_on(store.create_page(&broken, "Lost")).unwrap();
    let healthy = block_on(store.create_workspace("Healthy")).unwrap();
    block_on(store.create_page(&healthy, "Kept")).unwrap();

    datastore.set_fail_pages_for(Some(&broken));
    let fresh = store_with(datastore);

    let workspaces = fresh.workspaces();
    assert_eq!(workspaces.len(), 2);
    assert!(fresh.workspace(&broken).unwrap().pages.is_empty());
    assert_eq!(fresh.workspace(&healthy).unwrap().pages.len(), 1);
}

#[test]
fn content_items_map_onto_pages() {
    let (store, _) = store();
    let ws = block_on(store.create_workspace("Inbox")).unwrap();

    let note = block_on(store.add_content_item(
        &ws,
        NewContentItem {
            kind: ContentKind::Note,
            title: "Groceries".to_string(),
            content: "milk, eggs".to_string(),
        },
    ))
    .unwrap();

    let image = block_on(store.add_content_item(
        &ws,
        NewContentItem {
            kind: ContentKind::Image,
            title: "Sketch".to_string(),
            content: "data:image/png;base64,Zm9v".to_string(),
        },
    ))
    .unwrap();

    let workspace = store.workspace(&ws).unwrap();
    assert_eq!(workspace.pages.len(), 2);

    let note_page = workspace.page(&note).unwrap();
    assert_eq!(note_page.body, "milk, eggs");
    assert!(note_page.attachments.is_empty());

    let image_page = workspace.page(&image).unwrap();
    assert!(image_page.body.is_empty());
    assert_eq!(image_page.attachments.len(), 1);
    assert_eq!(image_page.attachments[0].url, "data:image/png;base64,Zm9v");
}

#[test]
fn attachments_add_and_remove() {
    let (store, datastore) = store();
    let ws = block_on(store.create_workspace("Notes")).unwrap();
    let page = block_on(store.create_page(&ws, "Moodboard")).unwrap();

    let id = block_on(store.add_attachment(&ws, &page, b"imagebytes", "cat.jpg")).unwrap();
    let workspace = store.workspace(&ws).unwrap();
    let attachments = &workspace.page(&page).unwrap().attachments;
    assert_eq!(attachments.len(), 1);
    assert!(attachments[0].url.starts_with("data:image/jpeg;base64,"));
    assert_eq!(datastore.attachment_count(), 1);

    block_on(store.remove_attachment(&ws, &page, &id)).unwrap();
    assert!(store
        .workspace(&ws)
        .unwrap()
        .page(&page)
        .unwrap()
        .attachments
        .is_empty());
    assert_eq!(datastore.attachment_count(), 0);
}

#[test]
fn deleting_selected_workspace_falls_back_to_first_remaining() {
    let (store, _) = store();
    let first = block_on(store.create_workspace("First")).unwrap();
    let second = block_on(store.create_workspace("Second")).unwrap();
    assert_eq!(store.current_workspace_id(), Some(second.clone()));

    block_on(store.delete_workspace(&second)).unwrap();
    assert_eq!(store.current_workspace_id(), Some(first.clone()));

    block_on(store.delete_workspace(&first)).unwrap();
    assert_eq!(store.current_workspace_id(), None);
}

#[test]
fn store_runs_unchanged_over_the_local_json_backend() {
    let fs = InMemoryFileSystem::new();
    let identity = LocalIdentity::with_storage(Arc::new(fs.clone()), "data/users.json");
    let signed_up = block_on(identity.signup("ada@example.com")).unwrap();

    let datastore = Arc::new(LocalDatastore::new(Arc::new(fs.clone()), "data"));
    let store = WorkspaceStore::new(Arc::clone(&datastore) as Arc<dyn Datastore>, ShareLinks::new(ORIGIN));
    block_on(store.set_identity(identity.current_user()));

    let ws = block_on(store.create_workspace("Notes")).unwrap();
    let page = block_on(store.create_page(&ws, "Todo")).unwrap();
    block_on(store.update_page(&ws, &page, PageUpdate::new().body("hello"))).unwrap();

    // The collection lands under the per-user document key
    let key = format!("data/workspaces-{}.json", signed_up.id);
    assert!(fs.exists(std::path::Path::new(&key)));

    // A fresh session reloads the same state from the JSON document
    let fresh = WorkspaceStore::new(datastore, ShareLinks::new(ORIGIN));
    block_on(fresh.set_identity(Some(signed_up)));
    let workspaces = fresh.workspaces();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].pages[0].body, "hello");
}

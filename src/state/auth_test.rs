use super::*;
use crate::state::session::{TOKEN_KEY, USER_KEY};
use crate::util::storage::{FileStore, MemoryStore};

fn alice() -> User {
    User {
        id: "u1".to_owned(),
        name: "Alice".to_owned(),
        username: "alice".to_owned(),
        email: "alice@example.com".to_owned(),
    }
}

fn session() -> Session {
    Session { token: "tok-1".to_owned(), user: alice() }
}

fn stored_backend() -> MemoryStore {
    let mut store = SessionStore::new(MemoryStore::new());
    store.save(&session()).unwrap();
    store.into_inner()
}

// =============================================================================
// init
// =============================================================================

#[test]
fn init_empty_store_is_anonymous() {
    let manager = SessionManager::init(MemoryStore::new());
    assert_eq!(manager.state(), AuthState::anonymous());
    assert!(manager.token().is_none());
}

#[test]
fn init_with_stored_session_is_authenticated() {
    let manager = SessionManager::init(stored_backend());
    assert!(manager.is_authenticated());
    assert_eq!(manager.current_user(), Some(alice()));
    assert_eq!(manager.token().as_deref(), Some("tok-1"));
}

#[test]
fn init_from_session_file_is_authenticated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let mut store = SessionStore::new(FileStore::open(&path));
    store.save(&session()).unwrap();
    drop(store);

    let manager = SessionManager::init(FileStore::open(&path));
    assert_eq!(manager.state(), AuthState::authenticated(alice()));
    assert_eq!(manager.token().as_deref(), Some("tok-1"));
}

#[test]
fn init_with_malformed_user_is_anonymous() {
    let mut backend = MemoryStore::new();
    backend.set(TOKEN_KEY, "tok-1").unwrap();
    backend.set(USER_KEY, "not json").unwrap();
    let manager = SessionManager::init(backend);
    assert!(!manager.is_authenticated());
    assert!(manager.token().is_none());
}

// =============================================================================
// transitions
// =============================================================================

#[test]
fn establish_authenticates_and_persists() {
    let manager = SessionManager::init(MemoryStore::new());
    manager.establish(&session()).unwrap();
    assert_eq!(manager.state(), AuthState::authenticated(alice()));

    let backend = manager.teardown();
    assert_eq!(SessionStore::new(backend).load(), Some(session()));
}

#[test]
fn signout_returns_to_anonymous_and_clears_store() {
    let manager = SessionManager::init(stored_backend());
    manager.signout().unwrap();
    assert_eq!(manager.state(), AuthState::anonymous());
    assert!(manager.teardown().is_empty());
}

#[test]
fn signout_from_session_file_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let mut store = SessionStore::new(FileStore::open(&path));
    store.save(&session()).unwrap();
    drop(store);

    // Block the temp file so only a whole-file delete can succeed.
    std::fs::create_dir(dir.path().join("session.tmp")).unwrap();
    let manager = SessionManager::init(FileStore::open(&path));
    manager.signout().unwrap();
    assert!(!manager.is_authenticated());

    let restarted = SessionManager::init(FileStore::open(&path));
    assert!(!restarted.is_authenticated());
    assert!(restarted.token().is_none());
}

#[test]
fn invalidate_returns_to_anonymous() {
    let manager = SessionManager::init(stored_backend());
    manager.invalidate("tok-1");
    assert!(!manager.is_authenticated());
    assert!(manager.token().is_none());
}

#[test]
fn invalidate_stale_token_keeps_newer_session() {
    let manager = SessionManager::init(stored_backend());
    let mut events = manager.events();
    let renewed = Session { token: "tok-2".to_owned(), user: alice() };
    manager.establish(&renewed).unwrap();

    manager.invalidate("tok-1");

    assert_eq!(manager.token().as_deref(), Some("tok-2"));
    assert!(manager.is_authenticated());
    assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedIn(alice()));
    assert!(events.try_recv().is_err());
}

#[test]
fn update_user_replaces_cached_user() {
    let manager = SessionManager::init(stored_backend());
    let renamed = User { name: "Alice L".to_owned(), ..alice() };
    manager.update_user(&renamed).unwrap();
    assert_eq!(manager.current_user(), Some(renamed));
    assert_eq!(manager.token().as_deref(), Some("tok-1"));
}

#[test]
fn update_user_while_anonymous_is_ignored() {
    let manager = SessionManager::init(MemoryStore::new());
    manager.update_user(&alice()).unwrap();
    assert!(!manager.is_authenticated());
    assert!(manager.teardown().is_empty());
}

#[test]
fn cycles_between_states() {
    let manager = SessionManager::init(MemoryStore::new());
    for _ in 0..3 {
        manager.establish(&session()).unwrap();
        assert!(manager.is_authenticated());
        manager.signout().unwrap();
        assert!(!manager.is_authenticated());
    }
}

// =============================================================================
// notifications
// =============================================================================

#[test]
fn events_report_each_transition() {
    let manager = SessionManager::init(MemoryStore::new());
    let mut events = manager.events();

    manager.establish(&session()).unwrap();
    manager.invalidate("tok-1");
    manager.establish(&session()).unwrap();
    manager.signout().unwrap();

    assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedIn(alice()));
    assert_eq!(events.try_recv().unwrap(), AuthEvent::Expired);
    assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedIn(alice()));
    assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedOut);
    assert!(events.try_recv().is_err());
}

#[test]
fn invalidate_without_session_is_silent() {
    let manager = SessionManager::init(MemoryStore::new());
    let mut events = manager.events();
    manager.invalidate("tok-1");
    assert!(events.try_recv().is_err());
    assert!(!manager.is_authenticated());
}

#[tokio::test]
async fn watchers_observe_invalidation() {
    let manager = SessionManager::init(stored_backend());
    let mut watcher = manager.subscribe();
    assert!(watcher.borrow_and_update().is_authenticated);

    manager.invalidate("tok-1");

    watcher.changed().await.unwrap();
    assert_eq!(*watcher.borrow(), AuthState::anonymous());
}

#[test]
fn watchers_not_woken_when_state_unchanged() {
    let manager = SessionManager::init(MemoryStore::new());
    let watcher = manager.subscribe();
    manager.signout().unwrap();
    assert!(!watcher.has_changed().unwrap());
}

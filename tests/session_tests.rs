//! Integration tests for the unlock / CRUD / lock lifecycle.

use std::path::PathBuf;

use securepass::errors::VaultError;
use securepass::vault::{create_vault, CredentialStore, EntryDraft, HashPolicy, Session};
use tempfile::TempDir;

const PASSWORD: &str = "Sup3rSecret!";

/// Cheap Argon2 parameters so bootstrap-heavy tests stay fast.
fn fast_policy() -> HashPolicy {
    HashPolicy {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
        output_len: 32,
    }
}

fn new_vault() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("v.spdb");
    create_vault(&path, PASSWORD).expect("create vault");
    (dir, path)
}

fn open(path: &std::path::Path) -> Session {
    Session::unlock_with_policy(path, PASSWORD, fast_policy()).expect("unlock")
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn create_add_save_restart_read_back() {
    let (_dir, path) = new_vault();

    let (category, entry) = {
        let mut session = Session::unlock(&path, PASSWORD).unwrap();
        let category = session.add_category("Banking", Some("#10b981")).unwrap();
        let entry = session
            .add_entry(&EntryDraft::new("Bank", "p@ss").with_category(category))
            .unwrap();
        session.save().unwrap();
        session.close().unwrap();
        (category, entry)
    };

    // "Process restart": nothing but the file survives.
    let session = Session::unlock(&path, PASSWORD).unwrap();
    let stored = session.get_entry(entry).unwrap().unwrap();
    assert_eq!(stored.name, "Bank");
    assert_eq!(stored.category_id, Some(category));
    assert_eq!(&*session.decrypt_field(&stored.secret_password).unwrap(), "p@ss");
    assert_eq!(session.get_category(category).unwrap().unwrap().name, "Banking");
}

#[test]
fn mutations_are_durable_without_save() {
    let (_dir, path) = new_vault();
    let id = {
        let mut session = open(&path);
        let id = session.add_entry(&EntryDraft::new("Mail", "hunter22")).unwrap();
        // Dropped without save or close.
        drop(session);
        id
    };

    let session = open(&path);
    assert!(session.get_entry(id).unwrap().is_some());
}

#[test]
fn new_vault_has_default_categories_and_no_entries() {
    let (_dir, path) = new_vault();
    let session = open(&path);
    let names: Vec<String> = session
        .list_categories()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Email", "Finance", "General", "Social Media"]);
    assert!(session.list_entries().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Lock semantics
// ---------------------------------------------------------------------------

#[test]
fn lock_twice_is_fine() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    assert!(!session.is_locked());

    session.lock().unwrap();
    session.lock().unwrap();
    assert!(session.is_locked());
    session.close().unwrap();
}

#[test]
fn crud_after_lock_is_refused() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    session.lock().unwrap();

    assert!(matches!(session.list_categories(), Err(VaultError::Locked)));
    assert!(matches!(
        session.add_entry(&EntryDraft::new("x", "y")),
        Err(VaultError::Locked)
    ));
    assert!(matches!(session.decrypt_field(b"anything"), Err(VaultError::Locked)));
}

#[test]
fn failed_unlock_leaves_no_session() {
    let (_dir, path) = new_vault();
    assert!(matches!(
        Session::unlock(&path, "not the password"),
        Err(VaultError::WrongPasswordOrCorrupt)
    ));
    // The right password still works afterwards.
    assert!(Session::unlock(&path, PASSWORD).is_ok());
}

// ---------------------------------------------------------------------------
// Categories and entries
// ---------------------------------------------------------------------------

#[test]
fn deleting_category_keeps_entries() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    let cat = session.add_category("Work", None).unwrap();
    let ids: Vec<i64> = (0..3)
        .map(|i| {
            session
                .add_entry(&EntryDraft::new(format!("e{i}"), "pw").with_category(cat))
                .unwrap()
        })
        .collect();
    let other = session.add_entry(&EntryDraft::new("loose", "pw")).unwrap();

    assert_eq!(session.delete_category(cat).unwrap(), 3);
    session.close().unwrap();

    let session = open(&path);
    assert_eq!(session.list_entries().unwrap().len(), 4);
    for id in ids {
        assert_eq!(session.get_entry(id).unwrap().unwrap().category_id, None);
    }
    assert!(session.get_entry(other).unwrap().is_some());
    assert!(session.get_category(cat).unwrap().is_none());
}

#[test]
fn update_entry_persists_and_keeps_created_at() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    let id = session
        .add_entry(&EntryDraft::new("Site", "old").with_username("me"))
        .unwrap();
    let created = session.get_entry(id).unwrap().unwrap().created_at;

    session
        .update_entry(id, &EntryDraft::new("Site", "new").with_website("https://site.example"))
        .unwrap();
    session.close().unwrap();

    let session = open(&path);
    let entry = session.get_entry(id).unwrap().unwrap();
    assert_eq!(entry.created_at, created);
    assert!(entry.updated_at >= created);
    assert_eq!(entry.username, None);
    assert_eq!(entry.website_url.as_deref(), Some("https://site.example"));
    assert_eq!(&*session.decrypt_field(&entry.secret_password).unwrap(), "new");
}

#[test]
fn list_is_most_recent_first() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    let first = session.add_entry(&EntryDraft::new("first", "pw")).unwrap();
    let second = session.add_entry(&EntryDraft::new("second", "pw")).unwrap();

    let order: Vec<i64> = session.list_entries().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(order, [second, first]);

    session.update_entry(first, &EntryDraft::new("first", "pw2")).unwrap();
    let order: Vec<i64> = session.list_entries().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(order[0], first);
}

#[test]
fn search_ignores_secret_columns() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    session
        .add_entry(&EntryDraft::new("GitLab", "needle").with_notes("needle"))
        .unwrap();
    session
        .add_entry(&EntryDraft::new("Forum", "pw").with_username("NeedleFan"))
        .unwrap();

    let hits = session.search("needle").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Forum");
}

#[test]
fn delete_entry_is_unconditional() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    let id = session.add_entry(&EntryDraft::new("gone", "pw")).unwrap();
    session.delete_entry(id).unwrap();
    session.delete_entry(id).unwrap();
    assert!(session.get_entry(id).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

#[test]
fn credential_bootstrap_flow() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    assert!(!session.has_credential().unwrap());

    session.bootstrap_credential(PASSWORD).unwrap();
    assert!(session.has_credential().unwrap());
    assert!(session.verify_credential(PASSWORD).unwrap());
    assert!(!session.verify_credential("wrong").unwrap());
    session.close().unwrap();

    // The hash was sealed into the file.
    let mut session = open(&path);
    assert!(session.has_credential().unwrap());
    assert!(session.verify_credential(PASSWORD).unwrap());
}

#[test]
fn hash_upgrade_scenario() {
    let weak = CredentialStore::new(HashPolicy {
        memory_kib: 4_096,
        iterations: 1,
        parallelism: 1,
        output_len: 32,
    });
    let current = CredentialStore::new(fast_policy());

    let hash = weak.hash_password(PASSWORD).unwrap();
    assert!(current.needs_rehash(&hash).unwrap());

    let rehashed = current.hash_password(PASSWORD).unwrap();
    assert!(!current.needs_rehash(&rehashed).unwrap());
    assert!(CredentialStore::verify_hash(PASSWORD, &rehashed).unwrap());
}

#[test]
fn change_master_password_rekeys_everything() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    session.bootstrap_credential(PASSWORD).unwrap();
    let id = session
        .add_entry(
            &EntryDraft::new("Mail", "mail-pw")
                .with_notes("recovery codes")
                .with_totp("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"),
        )
        .unwrap();
    session.enable_unlock_totp("JBSWY3DPEHPK3PXP").unwrap();

    assert!(matches!(
        session.change_master_password("not-the-old-one", "N3wPassword!"),
        Err(VaultError::WrongPasswordOrCorrupt)
    ));
    session.change_master_password(PASSWORD, "N3wPassword!").unwrap();
    session.close().unwrap();

    assert!(matches!(
        Session::unlock(&path, PASSWORD),
        Err(VaultError::WrongPasswordOrCorrupt)
    ));
    let mut session = Session::unlock_with_policy(&path, "N3wPassword!", fast_policy()).unwrap();
    assert!(session.verify_credential("N3wPassword!").unwrap());

    let entry = session.get_entry(id).unwrap().unwrap();
    assert_eq!(&*session.decrypt_field(&entry.secret_password).unwrap(), "mail-pw");
    assert_eq!(
        &*session.decrypt_field(entry.secret_notes.as_ref().unwrap()).unwrap(),
        "recovery codes"
    );
    assert_eq!(session.entry_totp(id, 59).unwrap().unwrap().digits, "287082");
    assert_eq!(
        session.unlock_totp_secret().unwrap().as_deref().map(|s| s.as_str()),
        Some("JBSWY3DPEHPK3PXP")
    );
}

#[test]
fn change_master_password_enforces_policy() {
    let (_dir, path) = new_vault();
    let mut session = open(&path);
    assert!(matches!(
        session.change_master_password(PASSWORD, "short"),
        Err(VaultError::PolicyViolation(_))
    ));
}

use crate::auth;
use crate::errors::AppError;
use crate::registry::{RegistryCsv, UserRegistry, UserTopicRow};

fn fresh_mgr() -> (RegistryCsv, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let csv_path = tmp.path().join("users.csv");
    let mgr = RegistryCsv::load(csv_path.to_str().unwrap()).unwrap();
    (mgr, tmp)
}

// --- register / login ---

#[test]
fn register_twice_is_rejected() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    let err = mgr.register("alice@example.com", "other-pw").unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists));
}

#[test]
fn register_rejects_malformed_email() {
    let (mgr, _tmp) = fresh_mgr();
    let err = mgr.register("not-an-email", "pw").unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[test]
fn login_roundtrip() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();

    assert_eq!(
        mgr.login("alice@example.com", "pw").unwrap(),
        "alice@example.com"
    );
    assert!(matches!(
        mgr.login("alice@example.com", "wrong"),
        Err(AppError::Unauthorized)
    ));
    assert!(matches!(
        mgr.login("nobody@example.com", "pw"),
        Err(AppError::Unauthorized)
    ));
}

#[test]
fn same_password_stores_different_hashes() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "shared-pw").unwrap();
    mgr.register("bob@example.com", "shared-pw").unwrap();

    let rows = mgr.dump().unwrap();
    let alice = rows.iter().find(|r| r.email == "alice@example.com").unwrap();
    let bob = rows.iter().find(|r| r.email == "bob@example.com").unwrap();
    assert_ne!(alice.password, bob.password);
    assert!(auth::verify_password(&alice.password, "shared-pw"));
    assert!(auth::verify_password(&bob.password, "shared-pw"));
}

// --- topics ---

#[test]
fn fresh_user_has_no_topics() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    assert!(mgr.topics("alice@example.com").unwrap().is_empty());
}

#[test]
fn topics_for_unknown_user() {
    let (mgr, _tmp) = fresh_mgr();
    assert!(matches!(
        mgr.topics("nobody@example.com"),
        Err(AppError::UserNotFound)
    ));
}

#[test]
fn add_topic_trims_whitespace() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    mgr.add_topic("alice@example.com", " AI ").unwrap();
    assert_eq!(mgr.topics("alice@example.com").unwrap(), vec!["AI"]);
}

#[test]
fn add_topic_rejects_blank() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    assert!(matches!(
        mgr.add_topic("alice@example.com", "   "),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn add_topic_for_unknown_user() {
    let (mgr, _tmp) = fresh_mgr();
    assert!(matches!(
        mgr.add_topic("nobody@example.com", "AI"),
        Err(AppError::UserNotFound)
    ));
}

#[test]
fn duplicate_add_is_permitted() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    mgr.add_topic("alice@example.com", "AI").unwrap();
    mgr.add_topic("alice@example.com", "AI").unwrap();
    assert_eq!(mgr.topics("alice@example.com").unwrap(), vec!["AI", "AI"]);
}

#[test]
fn topics_keep_insertion_order() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    for topic in ["zebra", "ai", "middle"] {
        mgr.add_topic("alice@example.com", topic).unwrap();
    }
    assert_eq!(
        mgr.topics("alice@example.com").unwrap(),
        vec!["zebra", "ai", "middle"]
    );
}

// --- delete ---

#[test]
fn delete_removes_all_duplicates_at_once() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    mgr.add_topic("alice@example.com", "AI").unwrap();
    mgr.add_topic("alice@example.com", "AI").unwrap();
    mgr.add_topic("alice@example.com", "ML").unwrap();

    mgr.delete_topic("alice@example.com", "AI").unwrap();
    assert_eq!(mgr.topics("alice@example.com").unwrap(), vec!["ML"]);

    assert!(matches!(
        mgr.delete_topic("alice@example.com", "AI"),
        Err(AppError::TopicNotFound)
    ));
}

#[test]
fn delete_normalizes_like_add() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    mgr.add_topic("alice@example.com", "AI").unwrap();

    // same trim on both paths, so a padded delete matches the stored topic
    mgr.delete_topic("alice@example.com", " AI ").unwrap();
    assert!(mgr.topics("alice@example.com").unwrap().is_empty());
}

#[test]
fn delete_for_unknown_user_or_topic() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();

    assert!(matches!(
        mgr.delete_topic("nobody@example.com", "AI"),
        Err(AppError::UserNotFound)
    ));
    assert!(matches!(
        mgr.delete_topic("alice@example.com", "AI"),
        Err(AppError::TopicNotFound)
    ));
}

// --- persistence ---

#[test]
fn save_load_roundtrip_preserves_users_and_topics() {
    let tmp = tempfile::tempdir().unwrap();
    let csv_path = tmp.path().join("users.csv");
    let path_str = csv_path.to_str().unwrap();

    {
        let mgr = RegistryCsv::load(path_str).unwrap();
        mgr.register("alice@example.com", "pw-a").unwrap();
        mgr.register("bob@example.com", "pw-b").unwrap();
        mgr.add_topic("alice@example.com", "AI").unwrap();
        mgr.add_topic("alice@example.com", "Robotics").unwrap();
    }

    // reload from disk
    let mgr = RegistryCsv::load(path_str).unwrap();
    assert_eq!(
        mgr.topics("alice@example.com").unwrap(),
        vec!["AI", "Robotics"]
    );
    assert!(mgr.topics("bob@example.com").unwrap().is_empty());
    assert_eq!(mgr.login("bob@example.com", "pw-b").unwrap(), "bob@example.com");
}

#[test]
fn load_nonexistent_creates_empty_table() {
    let tmp = tempfile::tempdir().unwrap();
    let csv_path = tmp.path().join("new.csv");
    let mgr = RegistryCsv::load(csv_path.to_str().unwrap()).unwrap();
    assert!(mgr.dump().unwrap().is_empty());
    assert!(csv_path.exists());
}

#[test]
fn placeholder_row_written_for_topicless_user() {
    let tmp = tempfile::tempdir().unwrap();
    let csv_path = tmp.path().join("users.csv");
    let path_str = csv_path.to_str().unwrap();

    let mgr = RegistryCsv::load(path_str).unwrap();
    mgr.register("alice@example.com", "pw").unwrap();

    let raw = std::fs::read_to_string(path_str).unwrap();
    let mut lines = raw.lines();
    assert_eq!(lines.next(), Some("email,password,topic"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("alice@example.com,"));
    assert!(row.ends_with(','), "placeholder row has an empty topic column");
}

#[test]
fn dump_flattens_entries_to_rows() {
    let (mgr, _tmp) = fresh_mgr();
    mgr.register("alice@example.com", "pw").unwrap();
    mgr.register("bob@example.com", "pw").unwrap();
    mgr.add_topic("alice@example.com", "AI").unwrap();
    mgr.add_topic("alice@example.com", "ML").unwrap();

    let rows = mgr.dump().unwrap();
    let topics: Vec<(&str, &str)> = rows
        .iter()
        .map(|UserTopicRow { email, topic, .. }| (email.as_str(), topic.as_str()))
        .collect();
    assert_eq!(
        topics,
        vec![
            ("alice@example.com", "AI"),
            ("alice@example.com", "ML"),
            ("bob@example.com", ""),
        ]
    );
}

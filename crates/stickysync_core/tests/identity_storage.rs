use stickysync_core::db::open_db;
use stickysync_core::storage::identity::{clear_identity, DISPLAY_NAME_KEY};
use stickysync_core::{
    load_identity, load_or_create_identity, IdentityError, IngestOutcome,
    KvStore, LlmModel, NoteColor, Session, SessionConfig, SharedMedium, SqliteMedium,
    TemplateGenerator,
};

#[test]
fn identity_survives_reopen_and_tracks_latest_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("identity.db");

    let conn = open_db(&path).unwrap();
    let first = load_or_create_identity(&KvStore::new(&conn), " Ada ").unwrap();
    assert_eq!(first.display_name, "Ada");
    assert!(first.participant_id.as_str().starts_with("user-"));
    drop(conn);

    let conn = open_db(&path).unwrap();
    let kv = KvStore::new(&conn);
    assert_eq!(load_identity(&kv).unwrap(), Some(first.clone()));

    let renamed = load_or_create_identity(&kv, "Ada L.").unwrap();
    assert_eq!(renamed.participant_id, first.participant_id);
    assert_eq!(
        kv.get(DISPLAY_NAME_KEY).unwrap().as_deref(),
        Some("Ada L.")
    );
}

#[test]
fn blank_display_name_is_rejected_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("blank.db")).unwrap();
    let kv = KvStore::new(&conn);

    let err = load_or_create_identity(&kv, "  \t").unwrap_err();
    assert!(matches!(err, IdentityError::BlankDisplayName));
    assert_eq!(load_identity(&kv).unwrap(), None);
}

#[test]
fn cleared_identity_gets_a_fresh_participant_id() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("clear.db")).unwrap();
    let kv = KvStore::new(&conn);

    let first = load_or_create_identity(&kv, "Ada").unwrap();
    clear_identity(&kv).unwrap();
    assert_eq!(load_identity(&kv).unwrap(), None);

    let second = load_or_create_identity(&kv, "Ada").unwrap();
    assert_ne!(first.participant_id, second.participant_id);
}

#[test]
fn sqlite_medium_is_shared_between_handles_on_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    let writer = SqliteMedium::open(&path).unwrap();
    let reader = SqliteMedium::open(&path).unwrap();

    assert_eq!(reader.fetch().unwrap(), None);
    writer.publish("{\"logicalClock\":1}").unwrap();
    assert_eq!(
        reader.fetch().unwrap().as_deref(),
        Some("{\"logicalClock\":1}")
    );

    reader.clear().unwrap();
    assert_eq!(writer.fetch().unwrap(), None);
}

#[test]
fn session_resumes_board_from_sqlite_medium() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");

    let conn = open_db(&path).unwrap();
    let identity = load_or_create_identity(&KvStore::new(&conn), "Ada").unwrap();
    drop(conn);

    let note_id = {
        let mut session = Session::new(
            SessionConfig::default(),
            identity.clone(),
            SqliteMedium::open(&path).unwrap(),
            TemplateGenerator::builtin(),
            1,
        );
        session.start(0);
        let note = session
            .create_note("Keep", "remember me", NoteColor::Orange, LlmModel::Gpt4)
            .unwrap();
        session.advance_to(3_000);
        note.id
    };

    let mut resumed = Session::new(
        SessionConfig::default(),
        identity,
        SqliteMedium::open(&path).unwrap(),
        TemplateGenerator::builtin(),
        2,
    );
    assert_eq!(resumed.start(0), IngestOutcome::Applied(2));
    assert!(resumed.store().get(&note_id).is_some());
    assert!(resumed.store().response(&note_id).unwrap().is_some());

    assert!(resumed.update_color(&note_id, NoteColor::Purple).unwrap());
}

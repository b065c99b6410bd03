use rand::rngs::StdRng;
use rand::SeedableRng;
use stickysync_core::{
    CanvasBounds, LlmModel, Note, NoteColor, NoteId, NoteStore, ParticipantId, SpawnRegion,
    StoreError,
};

fn store() -> NoteStore {
    let mut store = NoteStore::with_rng(
        CanvasBounds::default(),
        SpawnRegion::default(),
        StdRng::seed_from_u64(42),
    );
    store.seed_examples(0);
    store
}

#[test]
fn created_note_has_position_in_spawn_region_and_pending_response() {
    let mut store = store();
    let owner = ParticipantId::new("u1");

    let note = store
        .create_note(&owner, "  Ideas ", " plan a picnic ", NoteColor::Pink, LlmModel::Llama3, 10)
        .unwrap();
    assert_eq!(note.title, "Ideas");
    assert_eq!(note.prompt, "plan a picnic");
    assert_eq!(note.owner_id.as_ref(), Some(&owner));

    let position = store.position(&note.id).unwrap();
    assert!((350.0..=450.0).contains(&position.x), "x={}", position.x);
    assert!((150.0..=300.0).contains(&position.y), "y={}", position.y);
    assert_eq!(store.response(&note.id), Some(None));
    assert_eq!(store.len(), 4);
}

#[test]
fn blank_title_or_prompt_is_rejected_without_side_effects() {
    let mut store = store();
    let owner = ParticipantId::new("u1");

    let err = store
        .create_note(&owner, "   ", "prompt", NoteColor::Yellow, LlmModel::Gpt4, 0)
        .unwrap_err();
    assert_eq!(err, StoreError::Validation { field: "title" });
    let err = store
        .create_note(&owner, "title", "\n\t", NoteColor::Yellow, LlmModel::Gpt4, 0)
        .unwrap_err();
    assert_eq!(err, StoreError::Validation { field: "prompt" });
    assert_eq!(store.len(), 3);
}

#[test]
fn delete_leaves_no_orphan_position_or_response() {
    let mut store = store();
    let owner = ParticipantId::new("u1");
    let note = store
        .create_note(&owner, "t", "p", NoteColor::Yellow, LlmModel::Gpt4, 0)
        .unwrap();

    store.delete_note(&note.id, &owner).unwrap();

    assert!(store.get(&note.id).is_none());
    assert!(store.position(&note.id).is_none());
    assert_eq!(store.response(&note.id), None);
    let contents = store.export();
    assert!(!contents.positions.contains_key(&note.id));
    assert!(!contents.responses.contains_key(&note.id));
}

#[test]
fn ownership_uses_exact_id_equality() {
    let mut store = store();
    let owner = ParticipantId::new("u1");
    let lookalike = ParticipantId::new("u10");
    let note = store
        .create_note(&owner, "t", "p", NoteColor::Yellow, LlmModel::Gpt4, 0)
        .unwrap();

    assert!(!store.can_edit(&note.id, &lookalike));
    let err = store.delete_note(&note.id, &lookalike).unwrap_err();
    assert!(matches!(err, StoreError::Permission { .. }));
    let err = store
        .update_color(&note.id, NoteColor::Green, &lookalike)
        .unwrap_err();
    assert!(matches!(err, StoreError::Permission { .. }));

    assert!(store.update_color(&note.id, NoteColor::Green, &owner).unwrap());
    assert!(!store.update_color(&note.id, NoteColor::Green, &owner).unwrap());
}

#[test]
fn seed_notes_are_editable_by_anyone() {
    let mut store = store();
    let seed = NoteId::new("example-1");
    let anyone = ParticipantId::new("someone-else");

    assert!(store.get(&seed).unwrap().is_seed());
    assert!(store.response(&seed).unwrap().is_some());
    assert!(store.update_model(&seed, LlmModel::GeminiPro, &anyone).unwrap());
    store.delete_note(&seed, &anyone).unwrap();
    assert_eq!(store.len(), 2);
}

#[test]
fn ownerless_remote_note_is_not_editable() {
    let mut store = store();
    let rogue = NoteId::new("rogue");
    let mut contents = store.export();
    contents.notes.push(Note {
        id: rogue.clone(),
        owner_id: None,
        title: "Rogue".to_string(),
        prompt: "take over".to_string(),
        color: NoteColor::Pink,
        model: LlmModel::Gpt4,
        created_at: 5,
    });
    contents.responses.insert(rogue.clone(), Some("done".to_string()));
    store.replace_all(contents);
    let anyone = ParticipantId::new("someone-else");

    assert!(!store.get(&rogue).unwrap().is_seed());
    assert!(!store.can_edit(&rogue, &anyone));
    let err = store.delete_note(&rogue, &anyone).unwrap_err();
    assert!(matches!(err, StoreError::Permission { .. }));
    let err = store
        .update_model(&rogue, LlmModel::Llama3, &anyone)
        .unwrap_err();
    assert!(matches!(err, StoreError::Permission { .. }));
    assert_eq!(store.len(), 4);

    assert!(store.can_edit(&NoteId::new("example-3"), &anyone));
}

#[test]
fn missing_note_reports_not_found() {
    let mut store = store();
    let ghost = NoteId::new("ghost");
    let err = store
        .delete_note(&ghost, &ParticipantId::new("u1"))
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound(ghost.clone()));
    assert!(!store.set_response(&ghost, Some("late".to_string())));
    assert!(store.set_position(&ghost, Default::default()).is_none());
}

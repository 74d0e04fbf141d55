//! Profiles through the live model and back to disk.

use deck::actions::{brightness, navigation};
use deck::cli::Session;
use deck::config::{self, BindingDocument, PageDocument, ProfileDocument, ProfileFormat};
use deck::device::DeviceModel;
use deck::model::Deck;
use deck::persistence::RecordingPersistence;
use serde_json::json;

use crate::common::fixtures::{self, TestProfile};
use crate::common::{TestDeck, init_test_logging};

#[test]
fn test_mixed_profile_round_trips_unchanged() {
    let profile = fixtures::mixed_profile();
    let mut t = TestDeck::new(&profile);

    let written = t.deck.to_document();
    assert_eq!(written.id, profile.id);
    assert_eq!(written.brightness, 60);
    assert_eq!(written.root, profile.root);
}

#[test]
fn test_round_trip_survives_visiting_folders() {
    let profile = fixtures::nested_folders();
    let mut t = TestDeck::new(&profile);

    t.press(3);
    t.press(5);
    assert_eq!(t.depth(), 2);
    let deep = t.deck.to_document();
    t.press(0);
    t.press(0);
    assert_eq!(t.depth(), 0);

    assert_eq!(deep.root, profile.root);
    assert_eq!(t.deck.to_document().root, profile.root);
}

#[test]
fn test_folder_settings_are_hoisted_into_children() {
    let mut t = TestDeck::new(&ProfileDocument::new("Hoist"));
    t.bind(4, navigation::KIND);
    t.press(4);
    t.bind(2, brightness::KIND);

    let doc = t.deck.to_document();
    assert_eq!(doc.root.bindings[&4], BindingDocument::action(navigation::KIND));
    assert!(doc.root.bindings[&4].settings.is_empty());

    let child = &doc.root.children[&4];
    assert_eq!(child.bindings[&0], BindingDocument::action(navigation::KIND));
    assert_eq!(child.bindings[&2].kind.as_deref(), Some(brightness::KIND));
    assert_eq!(
        serde_json::Value::Object(child.bindings[&2].settings.clone()),
        json!({ "mode": 0, "value": 1 })
    );
}

#[test]
fn test_stored_subpage_without_go_up_gets_one() {
    let mut profile = ProfileDocument::new("Legacy");
    profile
        .root
        .bindings
        .insert(3, BindingDocument::action(navigation::KIND));
    let mut child = PageDocument::default();
    child.bindings.insert(0, BindingDocument::action(brightness::KIND));
    profile.root.children.insert(3, child);

    let mut t = TestDeck::new(&profile);
    t.press(3);

    assert_eq!(t.kind_at(0).as_deref(), Some(navigation::KIND));
    assert_eq!(t.kind_at(1).as_deref(), Some(brightness::KIND));
    assert!(t.deck.is_navigate_up_slot(t.key(0)));
}

#[test]
fn test_page_documents_decode_under_a_parent() {
    init_test_logging();
    let mut deck = Deck::builder(DeviceModel::Mini)
        .persistence(RecordingPersistence::default())
        .build(&ProfileDocument::new("Pages"));
    let root = deck.root_page();

    let mut doc = PageDocument::default();
    doc.bindings.insert(2, BindingDocument::action(brightness::KIND));
    let page = deck.page_from_document(Some(root), &doc);

    assert_eq!(deck.get_parent(page), Some(root));
    assert_eq!(deck.get_parent(root), None);

    let encoded = deck.page_to_document(page);
    assert_eq!(encoded.bindings.len(), 2, "go-up key added");
    assert_eq!(encoded.bindings[&2], doc.bindings[&2]);

    deck.discard_page(page);
    assert!(!deck.pages().contains(page));
}

#[test]
fn test_active_page_cannot_be_discarded() {
    let mut t = TestDeck::new(&ProfileDocument::new("Active"));
    let root = t.deck.root_page();
    t.deck.discard_page(root);
    assert!(t.deck.pages().contains(root));
}

#[test]
fn test_yaml_profile_round_trips_through_session() {
    let profile = fixtures::mixed_profile();
    let file = TestProfile::yaml(&profile);
    assert_eq!(
        ProfileFormat::from_extension(&file.path),
        Some(ProfileFormat::Yaml)
    );

    let mut session = Session::open_with(
        &file.path,
        Deck::builder(DeviceModel::Mini).persistence(RecordingPersistence::default()),
        std::time::Duration::ZERO,
    )
    .unwrap();
    session.bind(5, brightness::KIND).unwrap();
    assert!(session.finish().unwrap());

    let back = file.load();
    assert_eq!(back.id, profile.id);
    assert!(back.modified.is_some());
    assert_eq!(back.root.bindings[&5].kind.as_deref(), Some(brightness::KIND));
    assert_eq!(back.root.children, profile.root.children);
}

#[test]
fn test_session_edits_inside_folder_path() {
    let file = TestProfile::json(&fixtures::nested_folders());
    let builder = Deck::builder(DeviceModel::Mini).persistence(RecordingPersistence::default());
    let mut session = Session::open_with(&file.path, builder, std::time::Duration::ZERO).unwrap();

    session.enter(&[3, 5]).unwrap();
    assert_eq!(session.folders(), &[3, 5]);
    session.bind(2, brightness::KIND).unwrap();
    session.finish().unwrap();

    let back = file.load();
    let leaf = back.root.descend(&[3, 5]).expect("leaf page kept");
    assert_eq!(leaf.bindings[&2].kind.as_deref(), Some(brightness::KIND));
    assert_eq!(leaf.bindings[&1].custom_icon.as_ref().unwrap().text.as_deref(), Some("Deep"));
}

#[test]
fn test_rendered_profile_parses_back() {
    let profile = fixtures::mixed_profile();
    for format in [ProfileFormat::Json, ProfileFormat::Yaml] {
        let text = config::render_profile(&profile, format).unwrap();
        assert_eq!(config::parse_profile(&text, format).unwrap(), profile);
    }
}

use serde_json::Value;
use versekit_core::clipboard::codec::{decode, encode};
use versekit_core::model::node::{BOOK_LIST_FORMAT, CHAPTER_LIST_FORMAT, VERSE_LIST_FORMAT};
use versekit_core::{
    Bible, BibleMetadata, Clipboard, ClipboardError, MemoryClipboard, NodeId, NodeKind, NodeTree,
    TEXT_FORMAT,
};

fn sample() -> Bible {
    Bible::from_books(
        BibleMetadata::new("Codec"),
        [NodeTree::book(1, "Genesis").with_children([
            NodeTree::chapter(1).with_children([
                NodeTree::verse(1, "In the beginning"),
                NodeTree::verse(2, "And the earth"),
            ]),
            NodeTree::chapter(2),
        ])],
    )
    .unwrap()
}

fn book_and_chapters(bible: &Bible) -> (NodeId, Vec<NodeId>) {
    let book = bible.children(bible.root()).unwrap()[0];
    (book, bible.children(book).unwrap().to_vec())
}

#[test]
fn chapter_payload_carries_deep_copies_without_ids() {
    let bible = sample();
    let (_, chapters) = book_and_chapters(&bible);

    let payload = encode(&bible, &chapters).unwrap();
    assert_eq!(payload.kind(), NodeKind::Chapter);
    assert_eq!(payload.format(), CHAPTER_LIST_FORMAT);
    assert_eq!(payload.text(), "1\n2");

    let json: Value = serde_json::from_str(payload.data()).unwrap();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["data"]["kind"], "chapter");
    assert_eq!(list[0]["children"].as_array().unwrap().len(), 2);
    assert_eq!(list[0]["children"][1]["data"]["text"], "And the earth");
    for id in &chapters {
        assert!(!payload.data().contains(&id.to_string()));
    }
}

#[test]
fn verse_summary_uses_verse_text() {
    let bible = sample();
    let (_, chapters) = book_and_chapters(&bible);
    let verses = bible.children(chapters[0]).unwrap().to_vec();

    let payload = encode(&bible, &verses).unwrap();
    assert_eq!(payload.text(), "In the beginning\nAnd the earth");

    let contents = payload.into_contents();
    assert!(contents.contains_key(VERSE_LIST_FORMAT));
    assert_eq!(contents[TEXT_FORMAT], "In the beginning\nAnd the earth");
    assert_eq!(contents.len(), 2);
}

#[test]
fn mixed_and_empty_selections_are_rejected() {
    let bible = sample();
    let (book, chapters) = book_and_chapters(&bible);

    assert!(matches!(
        encode(&bible, &[]),
        Err(ClipboardError::EmptySelection)
    ));
    assert!(matches!(
        encode(&bible, &[chapters[0], book]),
        Err(ClipboardError::MixedKinds)
    ));
    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        encode(&bible, &[missing]),
        Err(ClipboardError::NodeNotFound(id)) if id == missing
    ));
}

#[test]
fn decode_returns_the_encoded_trees() {
    let bible = sample();
    let (book, _) = book_and_chapters(&bible);

    let payload = encode(&bible, &[book]).unwrap();
    let trees = decode(BOOK_LIST_FORMAT, payload.data()).unwrap();
    assert_eq!(trees, vec![bible.to_tree(book).unwrap()]);
}

#[test]
fn decode_validates_kinds_at_every_depth() {
    let wrong_root = r#"[{"data":{"kind":"verse","number":1,"text":"x"}}]"#;
    assert!(matches!(
        decode(CHAPTER_LIST_FORMAT, wrong_root),
        Err(ClipboardError::UnexpectedKind {
            expected: NodeKind::Chapter,
            actual: NodeKind::Verse,
        })
    ));

    let wrong_child = r#"[{"data":{"kind":"book","number":1,"name":"Ruth"},
        "children":[{"data":{"kind":"verse","number":1,"text":"x"}}]}]"#;
    assert!(matches!(
        decode(BOOK_LIST_FORMAT, wrong_child),
        Err(ClipboardError::UnexpectedKind {
            expected: NodeKind::Chapter,
            actual: NodeKind::Verse,
        })
    ));

    assert!(matches!(
        decode(TEXT_FORMAT, "[]"),
        Err(ClipboardError::UnknownFormat(_))
    ));
    assert!(matches!(
        decode(VERSE_LIST_FORMAT, "{not json"),
        Err(ClipboardError::Decode(_))
    ));
}

#[test]
fn memory_clipboard_replaces_all_entries() {
    let bible = sample();
    let (book, chapters) = book_and_chapters(&bible);
    let mut clipboard = MemoryClipboard::new();

    clipboard.set_contents(encode(&bible, &[book]).unwrap().into_contents());
    assert!(clipboard.has_format(BOOK_LIST_FORMAT));

    clipboard.set_contents(encode(&bible, &chapters).unwrap().into_contents());
    assert!(!clipboard.has_format(BOOK_LIST_FORMAT));
    assert!(clipboard.has_format(CHAPTER_LIST_FORMAT));
    assert_eq!(clipboard.get(TEXT_FORMAT).as_deref(), Some("1\n2"));
    assert_eq!(clipboard.formats(), vec![CHAPTER_LIST_FORMAT, TEXT_FORMAT]);
}

use versekit_core::{
    Bible, BibleMetadata, HistoryError, NodeData, NodeId, NodeKind, NodeTree, TreeError,
    UndoManager,
};

fn chapters(numbers: &[i32]) -> Bible {
    Bible::from_books(
        BibleMetadata::new("Ordered"),
        [NodeTree::book(1, "Genesis")
            .with_children(numbers.iter().map(|number| NodeTree::chapter(*number)))],
    )
    .unwrap()
}

fn first_book(bible: &Bible) -> NodeId {
    bible.children(bible.root()).unwrap()[0]
}

fn numbers(bible: &Bible, parent: NodeId) -> Vec<i32> {
    bible
        .children(parent)
        .unwrap()
        .iter()
        .map(|id| bible.data(*id).unwrap().number().unwrap())
        .collect()
}

#[test]
fn from_books_links_parents_and_children() {
    let bible = Bible::from_books(
        BibleMetadata::new("Linked"),
        [NodeTree::book(1, "Genesis").with_children([
            NodeTree::chapter(1).with_children([NodeTree::verse(1, "a"), NodeTree::verse(2, "b")])
        ])],
    )
    .unwrap();

    assert_eq!(bible.len(), 5);
    for (parent, node) in bible.walk() {
        assert_eq!(node.parent(), Some(parent));
        assert_eq!(bible.kind_of(parent).unwrap().child_kind(), Some(node.kind()));
        assert!(bible.index_of(parent, node.id()).is_some());
    }
    let book = first_book(&bible);
    assert_eq!(bible.subtree_len(book), Some(4));
    assert_eq!(bible.to_tree(book).unwrap().children[0].children.len(), 2);
}

#[test]
fn from_books_rejects_misplaced_kinds() {
    let err = Bible::from_books(BibleMetadata::new("Bad"), [NodeTree::chapter(1)]).unwrap_err();
    assert!(matches!(
        err,
        TreeError::KindMismatch {
            expected: NodeKind::Book,
            actual: NodeKind::Chapter,
            ..
        }
    ));
}

#[test]
fn renumber_rewrites_numbers_without_reordering() {
    let bible = chapters(&[3, 1, 2]);
    let book = first_book(&bible);
    let order_before = bible.children(book).unwrap().to_vec();
    let mut history = UndoManager::new(bible);

    history.begin_batch("Renumber").unwrap();
    assert_eq!(history.renumber(book).unwrap(), 3);
    history.complete_batch().unwrap();

    assert_eq!(history.target().children(book).unwrap(), order_before.as_slice());
    assert_eq!(numbers(history.target(), book), vec![1, 2, 3]);
}

#[test]
fn reorder_sorts_by_number_without_renumbering() {
    let bible = chapters(&[3, 1, 2]);
    let book = first_book(&bible);
    let ids = bible.children(book).unwrap().to_vec();
    let mut history = UndoManager::new(bible);

    history.begin_batch("Reorder").unwrap();
    assert!(history.reorder(book).unwrap());
    history.complete_batch().unwrap();

    assert_eq!(numbers(history.target(), book), vec![1, 2, 3]);
    assert_eq!(
        history.target().children(book).unwrap(),
        &[ids[1], ids[2], ids[0]]
    );
}

#[test]
fn reorder_is_stable_for_equal_numbers_and_books_fall_back_to_name() {
    let bible = Bible::from_books(
        BibleMetadata::new("Books"),
        [
            NodeTree::book(2, "Leviticus"),
            NodeTree::book(2, "Exodus"),
            NodeTree::book(1, "Genesis"),
        ],
    )
    .unwrap();
    let root = bible.root();
    let mut history = UndoManager::new(bible);

    history.begin_batch("Reorder").unwrap();
    history.reorder(root).unwrap();
    history.complete_batch().unwrap();

    let names: Vec<&str> = history
        .target()
        .children(root)
        .unwrap()
        .iter()
        .map(|id| history.target().data(*id).unwrap().name().unwrap())
        .collect();
    assert_eq!(names, vec!["Genesis", "Exodus", "Leviticus"]);

    let duplicates = chapters(&[2, 1, 2]);
    let book = first_book(&duplicates);
    let ids = duplicates.children(book).unwrap().to_vec();
    let mut history = UndoManager::new(duplicates);
    history.begin_batch("Reorder").unwrap();
    history.reorder(book).unwrap();
    history.complete_batch().unwrap();
    assert_eq!(
        history.target().children(book).unwrap(),
        &[ids[1], ids[0], ids[2]]
    );
}

#[test]
fn remove_all_ignores_non_children_and_keeps_container_order() {
    let bible = chapters(&[1, 2, 3]);
    let book = first_book(&bible);
    let ids = bible.children(book).unwrap().to_vec();
    let mut history = UndoManager::new(bible);

    history.begin_batch("Delete").unwrap();
    let removed = history
        .remove_all(book, &[ids[2], uuid::Uuid::new_v4(), ids[0]])
        .unwrap();
    history.complete_batch().unwrap();

    let roots: Vec<NodeId> = removed.iter().map(|fragment| fragment.root()).collect();
    assert_eq!(roots, vec![ids[0], ids[2]]);
    assert_eq!(history.target().children(book).unwrap(), &[ids[1]]);
}

#[test]
fn insert_clamps_index_to_end() {
    let bible = chapters(&[1]);
    let book = first_book(&bible);
    let mut history = UndoManager::new(bible);

    history.begin_batch("Insert").unwrap();
    let inserted = history
        .insert(
            book,
            99,
            vec![versekit_core::model::bible::Fragment::from_tree(
                &NodeTree::chapter(2),
            )],
        )
        .unwrap();
    history.complete_batch().unwrap();

    assert_eq!(history.target().index_of(book, inserted[0]), Some(1));
}

#[test]
fn payload_edits_cannot_change_kind() {
    let bible = chapters(&[1]);
    let book = first_book(&bible);
    let mut history = UndoManager::new(bible);

    history.begin_batch("Edit").unwrap();
    let err = history
        .set_data(
            book,
            NodeData::Verse {
                number: 1,
                text: "x".to_string(),
            },
        )
        .unwrap_err();
    history.cancel_batch().unwrap();

    assert!(matches!(
        err,
        HistoryError::Tree(TreeError::DataKindChange { .. })
    ));
}

#[test]
fn leaves_cannot_hold_children() {
    let bible = Bible::from_books(
        BibleMetadata::new("Leaf"),
        [NodeTree::book(1, "Ruth")
            .with_children([NodeTree::chapter(1).with_children([NodeTree::verse(1, "v")])])],
    )
    .unwrap();
    let book = first_book(&bible);
    let chapter = bible.children(book).unwrap()[0];
    let verse = bible.children(chapter).unwrap()[0];
    let mut history = UndoManager::new(bible);

    history.begin_batch("Renumber").unwrap();
    let err = history.renumber(verse).unwrap_err();
    history.cancel_batch().unwrap();
    assert_eq!(err, HistoryError::Tree(TreeError::NotAContainer(verse)));
}

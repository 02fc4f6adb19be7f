//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `versekit_core` linkage.
//! - Exercise one edit/undo cycle on an in-memory document.
//! - Route core `event=` logs to `$TMPDIR/versekit-logs`.
//! - Keep output deterministic for quick local sanity checks.

use std::path::PathBuf;
use versekit_core::{
    Bible, BibleEditor, BibleMetadata, MemoryClipboard, MemorySettings, NodeTree,
};

fn smoke_log_dir() -> PathBuf {
    std::env::temp_dir().join("versekit-logs")
}

fn main() {
    println!("versekit_core ping={}", versekit_core::ping());
    println!("versekit_core version={}", versekit_core::core_version());

    let log_dir = smoke_log_dir();
    let level = versekit_core::default_log_level();
    match versekit_core::init_logging(level, &log_dir.to_string_lossy()) {
        Ok(()) => println!("versekit_core logging level={level} dir={}", log_dir.display()),
        Err(err) => eprintln!("versekit_core logging=error error={err}"),
    }

    let bible = match Bible::from_books(
        BibleMetadata::new("Smoke"),
        [NodeTree::book(1, "Genesis").with_children([
            NodeTree::chapter(1).with_children([NodeTree::verse(1, "In the beginning")])
        ])],
    ) {
        Ok(bible) => bible,
        Err(err) => {
            eprintln!("versekit_core smoke=error error={err}");
            std::process::exit(1);
        }
    };
    let root = bible.root();
    let mut editor = BibleEditor::new(
        bible,
        MemoryClipboard::new(),
        Box::new(MemorySettings::default()),
    );

    editor.select([root]);
    let created = editor.new_book().map(|id| id.is_some()).unwrap_or(false);
    let undone = editor.undo().unwrap_or(false);
    println!(
        "versekit_core smoke nodes={} created={} undone={} dirty={}",
        editor.document().len(),
        created,
        undone,
        editor.is_dirty()
    );
}

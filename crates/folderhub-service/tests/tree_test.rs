//! Integration tests for tree assembly.

mod helpers;

use std::sync::Arc;

use folderhub_core::config::FolderConfig;
use folderhub_database::MemoryFolderStore;

#[tokio::test]
async fn test_tree_excludes_trashed_child() {
    let app = helpers::TestApp::new();
    let ctx = app.ctx();
    let keep = app.create(&ctx, "Keep", None).await;
    let gone = app.create(&ctx, "Gone", None).await;
    app.create(&ctx, "Inside", Some(gone.id)).await;
    app.folders.trash(&ctx, gone.id).await.expect("trash");

    let view = app.tree.get_tree(&ctx, None).await.expect("tree");

    let children: Vec<_> = view.root.children.iter().map(|c| c.id).collect();
    assert_eq!(children, vec![keep.id]);
    assert!(view.root.find(gone.id).is_none());
    assert!(view.is_complete());
}

#[tokio::test]
async fn test_tree_shape() {
    let app = helpers::TestApp::new();
    let ctx = app.ctx();
    let docs = app.create(&ctx, "Docs", None).await;
    let y2023 = app.create(&ctx, "2023", Some(docs.id)).await;
    let y2024 = app.create(&ctx, "2024", Some(docs.id)).await;
    let q1 = app.create(&ctx, "Q1", Some(y2024.id)).await;
    app.create(&ctx, "Music", None).await;

    let view = app.tree.get_tree(&ctx, None).await.expect("tree");
    assert_eq!(view.root.count(), 6);
    assert_eq!(view.root.path, "/");

    let docs_node = view.root.find(docs.id).expect("docs");
    let names: Vec<&str> = docs_node.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["2023", "2024"]);
    assert!(docs_node.find(y2023.id).expect("2023").children.is_empty());

    let q1_node = view.root.find(q1.id).expect("q1");
    assert_eq!(q1_node.path, "/Docs/2024/Q1");
    assert_eq!(q1_node.depth, 3);
}

#[tokio::test]
async fn test_tree_reports_failed_listings() {
    let store = MemoryFolderStore::new();
    let flaky = Arc::new(helpers::FlakyStore::new(store.clone()));
    let app = helpers::TestApp::with_store(store, flaky.clone(), FolderConfig::default());
    let ctx = app.ctx();

    let a = app.create(&ctx, "A", None).await;
    app.create(&ctx, "A1", Some(a.id)).await;
    let b = app.create(&ctx, "B", None).await;
    let b1 = app.create(&ctx, "B1", Some(b.id)).await;

    flaky.break_listing(a.id);
    let view = app.tree.get_tree(&ctx, None).await.expect("tree");

    assert!(!view.is_complete());
    assert_eq!(view.failed, vec![a.id]);

    // A is present but its children could not be loaded.
    let a_node = view.root.find(a.id).expect("a");
    assert!(a_node.children.is_empty());
    // Other branches are unaffected.
    assert!(view.root.find(b1.id).is_some());
}

#[tokio::test]
async fn test_tree_root_listing_failure() {
    let store = MemoryFolderStore::new();
    let flaky = Arc::new(helpers::FlakyStore::new(store.clone()));
    let app = helpers::TestApp::with_store(store, flaky.clone(), FolderConfig::default());
    let ctx = app.ctx();
    app.create(&ctx, "A", None).await;
    let root = app.folders.ensure_root(&ctx).await.expect("root");

    flaky.break_listing(root.id);
    let view = app.tree.get_tree(&ctx, None).await.expect("partial tree");

    assert_eq!(view.root.id, root.id);
    assert!(view.root.children.is_empty());
    assert_eq!(view.failed, vec![root.id]);
}

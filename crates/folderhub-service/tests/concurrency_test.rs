//! Concurrency tests: root bootstrapping races and overlapping structural changes.

mod helpers;

use std::sync::Arc;

use futures::future::join_all;

use folderhub_core::ErrorKind;
use folderhub_service::{CreateFolderRequest, MoveFolderRequest, UpdateFolderRequest};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ensure_root_yields_one_root() {
    let app = Arc::new(helpers::TestApp::new());
    let ctx = app.ctx();

    let handles = (0..16).map(|_| {
        let app = app.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move { app.folders.ensure_root(&ctx).await })
    });

    let roots: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task").expect("ensure_root"))
        .collect();

    let first = roots[0].id;
    assert!(roots.iter().all(|r| r.id == first));
    assert_eq!(app.store.snapshot(ctx.owner_id).await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_with_same_name() {
    let app = Arc::new(helpers::TestApp::new());
    let ctx = app.ctx();

    let handles = (0..8).map(|_| {
        let app = app.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            app.folders
                .create(
                    &ctx,
                    CreateFolderRequest {
                        name: "Inbox".into(),
                        ..Default::default()
                    },
                )
                .await
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind == ErrorKind::NameTaken)
    );
    app.assert_consistent(ctx.owner_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_renames_and_moves_stay_consistent() {
    let app = Arc::new(helpers::TestApp::new());
    let ctx = app.ctx();

    let top = app.create(&ctx, "top", None).await;
    let mid = app.create(&ctx, "mid", Some(top.id)).await;
    let leaf = app.create(&ctx, "leaf", Some(mid.id)).await;
    app.create(&ctx, "bottom", Some(leaf.id)).await;
    let other = app.create(&ctx, "other", None).await;
    let (top_id, mid_id, other_id) = (top.id, mid.id, other.id);

    let mut handles = Vec::new();
    for i in 0..10 {
        let app = app.clone();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            match i % 3 {
                0 => app
                    .folders
                    .update(
                        &ctx,
                        top_id,
                        UpdateFolderRequest {
                            name: Some(format!("top{i}")),
                            ..Default::default()
                        },
                    )
                    .await
                    .map(|_| ()),
                1 => {
                    let dest = if i % 2 == 0 { other_id } else { top_id };
                    app.folders
                        .move_folder(&ctx, mid_id, MoveFolderRequest { parent_id: Some(dest) })
                        .await
                        .map(|_| ())
                }
                _ => app
                    .folders
                    .update(
                        &ctx,
                        mid_id,
                        UpdateFolderRequest {
                            name: Some(format!("mid{i}")),
                            ..Default::default()
                        },
                    )
                    .await
                    .map(|_| ()),
            }
        }));
    }

    for joined in join_all(handles).await {
        if let Err(e) = joined.expect("task") {
            // Moving into the current parent is the only expected refusal.
            assert_eq!(e.kind, ErrorKind::CannotMove);
        }
    }

    app.assert_consistent(ctx.owner_id).await;
}

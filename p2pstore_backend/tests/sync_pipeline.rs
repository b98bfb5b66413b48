mod common;

use common::{photo_message, text_message, with_reactions, Fixture, CHAT};
use p2pstore_backend::database::repositories::{
    MediaRepository, MessageRepository, ReactionRepository, UserRepository,
};
use p2pstore_backend::media_cache::MediaCache;
use p2pstore_backend::node::P2pStoreNode;
use p2pstore_backend::platform::ExportArchive;
use p2pstore_backend::sync::SyncError;
use p2pstore_backend::utils::RefreshFlag;

fn media_names(node: &P2pStoreNode, message_id: i64) -> Vec<String> {
    node.database()
        .with_repositories(|repos| repos.media().list_for_message(message_id))
        .expect("media rows")
        .into_iter()
        .filter_map(|row| row.name)
        .collect()
}

#[tokio::test]
async fn caption_less_run_merges_into_one_listing() {
    let fx = Fixture::new(0);
    fx.write_export(vec![
        photo_message(3, 7, "Bike for sale"),
        photo_message(2, 7, ""),
        photo_message(1, 7, ""),
    ]);
    for id in 1..=3 {
        fx.write_photo(id, format!("jpeg {id}").as_bytes());
    }

    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");
    let report = node.run_sync().await.expect("sync");
    assert_eq!(report.groups, 1);
    assert_eq!(report.media, 3);

    let listing = node.index().get(3).expect("indexed");
    let follow_ons: Vec<i64> = listing.group.follow_ons.iter().map(|m| m.id).collect();
    assert_eq!(follow_ons, vec![1, 2]);
    assert_eq!(
        media_names(&node, 3),
        vec!["photo_3.jpg", "photo_1.jpg", "photo_2.jpg"]
    );
    assert!(fx.config.paths.message_dir(1).join("photo_1.jpg").exists());

    node.database()
        .with_repositories(|repos| {
            assert_eq!(repos.messages().list_ids()?, vec![3]);
            let message = repos.messages().get(3)?.expect("message");
            assert_eq!(message.caption, "Bike for sale");
            assert_eq!(message.user_id, Some(7));
            Ok(())
        })
        .expect("verify");
}

#[tokio::test]
async fn run_from_another_author_is_never_persisted() {
    let fx = Fixture::new(0);
    fx.write_export(vec![text_message(2, Some(8), "WTB bike"), photo_message(1, 7, "")]);
    fx.write_photo(1, b"jpeg");

    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");
    let report = node.run_sync().await.expect("sync");
    assert_eq!(report.groups, 1);
    assert_eq!(report.unanchored, 1);
    assert_eq!(node.index().message_ids(), vec![2]);

    node.database()
        .with_repositories(|repos| {
            assert_eq!(repos.messages().list_ids()?, vec![2]);
            assert!(repos.users().get(7)?.is_none());
            assert!(repos.users().get(8)?.is_some());
            Ok(())
        })
        .expect("verify");
    assert!(!fx.config.paths.message_dir(1).exists());
}

#[tokio::test]
async fn channel_posts_create_nothing() {
    let fx = Fixture::new(0);
    fx.write_export(vec![text_message(1, None, "Market rules")]);

    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");
    let report = node.run_sync().await.expect("sync");
    assert_eq!(report.dropped, 1);
    assert!(node.index().is_empty());
    node.database()
        .with_repositories(|repos| {
            assert!(repos.messages().list_ids()?.is_empty());
            Ok(())
        })
        .expect("verify");
}

#[tokio::test]
async fn populated_cache_directory_is_reused() {
    let fx = Fixture::new(0);
    fx.write_export(vec![photo_message(1, 7, "Lamp")]);
    let dest = fx.config.paths.message_dir(1);
    std::fs::create_dir_all(&dest).expect("dest");
    std::fs::write(dest.join("lamp.jpg"), b"cached").expect("cached file");
    std::fs::write(dest.join("thumb-lamp.jpg"), b"cached thumb").expect("cached thumb");

    // The exported photo itself is missing, so any fetch would fail.
    let archive = ExportArchive::new(&fx.config.paths.export_dir);
    let message = archive.load(CHAT).await.expect("load").remove(0);
    let cache = MediaCache::new(&archive, RefreshFlag::default());

    let first = cache.cache_message_media(&message, &dest).await.expect("descriptor");
    let second = cache.cache_message_media(&message, &dest).await.expect("descriptor");
    assert_eq!(first, second);
    assert_eq!(second.name.as_deref(), Some("lamp.jpg"));
    assert_eq!(second.thumb_name.as_deref(), Some("thumb-lamp.jpg"));
}

#[tokio::test]
async fn second_pass_keeps_media_without_refetching() {
    let fx = Fixture::new(0);
    fx.write_export(vec![photo_message(1, 7, "Lamp")]);
    fx.write_photo(1, b"jpeg");

    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");
    node.run_sync().await.expect("first sync");
    fx.remove_photo(1);

    let report = node.run_sync().await.expect("second sync");
    assert_eq!(report.media, 1);
    assert_eq!(media_names(&node, 1), vec!["photo_1.jpg"]);
    assert_eq!(node.index().len(), 1);
}

#[tokio::test]
async fn redownload_refetches_cached_media() {
    let fx = Fixture::new(0);
    fx.write_export(vec![photo_message(1, 7, "Lamp")]);
    fx.write_photo(1, b"old");

    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");
    node.run_sync().await.expect("first sync");
    fx.write_photo(1, b"new");
    node.refresh_flag().set(true);
    node.run_sync().await.expect("second sync");

    let cached = fx.config.paths.message_dir(1).join("photo_1.jpg");
    assert_eq!(std::fs::read(cached).expect("cached"), b"new");
    assert_eq!(media_names(&node, 1), vec!["photo_1.jpg"]);
}

#[tokio::test]
async fn latest_reactions_replace_earlier_ones() {
    let fx = Fixture::new(0);
    fx.write_export(vec![with_reactions(
        text_message(1, Some(7), "Lamp"),
        &[("👍", 2), ("🔥", 1)],
    )]);

    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");
    node.run_sync().await.expect("first sync");

    fx.write_export(vec![with_reactions(
        text_message(1, Some(7), "Lamp"),
        &[("❤", 4)],
    )]);
    node.run_sync().await.expect("second sync");

    let reactions = node
        .database()
        .with_repositories(|repos| repos.reactions().list_for_message(1))
        .expect("reactions");
    let seen: Vec<(Option<String>, i64)> =
        reactions.into_iter().map(|r| (r.emoji, r.count)).collect();
    assert_eq!(seen, vec![(Some("❤".to_string()), 4)]);
}

#[tokio::test]
async fn missing_history_fails_without_writing() {
    let fx = Fixture::new(0);
    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");

    let err = node.run_sync().await.expect_err("no export present");
    assert!(matches!(err, SyncError::History(_)));
    node.database()
        .with_repositories(|repos| {
            assert!(repos.messages().list_ids()?.is_empty());
            Ok(())
        })
        .expect("verify");
}

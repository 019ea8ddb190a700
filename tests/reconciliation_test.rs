//! Integration tests for remote/local reconciliation

mod common;

use std::time::Duration;

use tunedle::remote::tables;
use tunedle::storage::StoreSource;
use tunedle::{FavoriteKey, FavoriteRef};

use common::{date, harness, user};

#[tokio::test]
async fn test_favorite_survives_remote_failure() {
    let h = harness();
    h.engine.on_auth_change(Some(user("u1"))).await.unwrap();
    let ctx = h.account(date(2024, 3, 1), "u1");

    h.remote.set_online(false);
    let added = h
        .engine
        .add_favorite(&ctx, &FavoriteRef::by_name("Pokemon Gold Silver", "New Bark Town"))
        .await
        .unwrap();
    assert!(added.degraded);
    assert_eq!(added.source, StoreSource::Local);

    let key = FavoriteKey::new("Pokemon Gold Silver", "New Bark Town");
    assert!(h.engine.is_favorite(&ctx, &key).unwrap());
    let favorites = h.engine.favorites(&ctx).unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].key(), key);
    assert!(h.remote.rows(tables::FAVORITES).is_empty());
}

#[tokio::test]
async fn test_answer_mirrors_stats_to_remote() {
    let h = harness();
    h.engine.on_auth_change(Some(user("u2"))).await.unwrap();
    let today = date(2024, 3, 1);
    let ctx = h.account(today, "u2");

    let answer = h.correct_answer(today).await;
    let outcome = h.engine.submit_daily_answer(&ctx, &answer).await.unwrap();
    assert!(!outcome.degraded);

    let rows = h.remote.rows(tables::USER_STATS);
    assert_eq!(rows.len(), 1);
    let remote_stats = tables::stats_from_row(&rows[0]);
    assert_eq!(remote_stats.total_plays, 1);
    assert_eq!(remote_stats.correct_answers, 1);
    assert_eq!(remote_stats.best_streak, 1);

    let local = h.engine.store().local().stats(&ctx.profile).unwrap();
    assert_eq!(local, remote_stats);
}

#[tokio::test]
async fn test_offline_answer_is_recorded_locally() {
    let h = harness();
    h.engine.on_auth_change(Some(user("u3"))).await.unwrap();
    let today = date(2024, 3, 1);
    let ctx = h.account(today, "u3");
    h.remote.set_online(false);
    // the catalog falls back to the bundled one as well
    let answer = h.correct_answer(today).await;
    let outcome = h.engine.submit_daily_answer(&ctx, &answer).await.unwrap();
    assert!(outcome.correct);
    assert!(outcome.degraded);
    assert_eq!(outcome.stats.unwrap().total_plays, 1);

    let stats = h.engine.stats(&ctx).await.unwrap();
    assert!(stats.degraded);
    assert_eq!(stats.value.total_plays, 1);
}

#[tokio::test]
async fn test_fuzzy_title_resolves_to_catalog_row() {
    let h = harness();
    h.engine.on_auth_change(Some(user("u4"))).await.unwrap();
    let ctx = h.account(date(2024, 3, 1), "u4");

    let added = h
        .engine
        .add_favorite(&ctx, &FavoriteRef::by_name("Pokemon Red Blue", "Route 1 Theme (Remix)"))
        .await
        .unwrap();
    assert!(added.value.canonical_id.is_some());

    let track_id = tables::row_id(&h.remote.rows(tables::TRACKS)[0]);
    assert_eq!(added.value.canonical_id, track_id);
}

#[tokio::test]
async fn test_typed_favorite_name_survives_reload() {
    let h = harness();
    h.engine.on_auth_change(Some(user("u5"))).await.unwrap();
    let ctx = h.account(date(2024, 3, 1), "u5");
    let typed = FavoriteRef::by_name("Pokemon Red Blue", "Route 1 Theme (Remix)");

    h.engine.add_favorite(&ctx, &typed).await.unwrap();
    let reloaded = h.engine.store().load_favorites(&ctx.profile).await.unwrap();
    assert_eq!(reloaded.value.len(), 1);
    assert_eq!(reloaded.value[0].key(), typed.key());
    assert!(h.engine.is_favorite(&ctx, &typed.key()).unwrap());

    h.engine.remove_favorite(&ctx, &typed).await.unwrap();
    assert!(!h.engine.is_favorite(&ctx, &typed.key()).unwrap());
    assert!(h.engine.favorites(&ctx).unwrap().is_empty());
    assert!(h.remote.rows(tables::FAVORITES).is_empty());
}

#[tokio::test]
async fn test_offline_changes_survive_recovery() {
    let h = harness();
    h.engine.on_auth_change(Some(user("u6"))).await.unwrap();
    let today = date(2024, 3, 1);
    let ctx = h.account(today, "u6");
    let fav = FavoriteRef::by_name("Pokemon Gold Silver", "New Bark Town");
    h.engine.add_favorite(&ctx, &fav).await.unwrap();
    assert_eq!(h.remote.rows(tables::FAVORITES).len(), 1);

    h.remote.set_online(false);
    let removed = h.engine.remove_favorite(&ctx, &fav).await.unwrap();
    assert!(removed.degraded);
    let answer = h.correct_answer(today).await;
    let outcome = h.engine.submit_daily_answer(&ctx, &answer).await.unwrap();
    assert!(outcome.degraded);

    // the next command signs in again with the remote reachable
    h.remote.set_online(true);
    let next = h.reopen();
    next.on_auth_change(Some(user("u6"))).await.unwrap();

    assert!(!next.is_favorite(&ctx, &fav.key()).unwrap());
    assert!(next.favorites(&ctx).unwrap().is_empty());
    assert!(h.remote.rows(tables::FAVORITES).is_empty());

    let stats = next.stats(&ctx).await.unwrap();
    assert!(!stats.degraded);
    assert_eq!(stats.value.total_plays, 1);
    assert_eq!(stats.value.correct_answers, 1);
    let remote_stats = tables::stats_from_row(&h.remote.rows(tables::USER_STATS)[0]);
    assert_eq!(remote_stats, stats.value);
}

#[tokio::test]
async fn test_concurrent_toggle_of_same_favorite_applies_in_order() {
    let h = harness();
    h.engine.on_auth_change(Some(user("u7"))).await.unwrap();
    let ctx = h.account(date(2024, 3, 1), "u7");
    let fav = FavoriteRef::by_name("Pokemon Ruby Sapphire", "Route 113");
    h.remote.set_latency(Some(Duration::from_millis(20)));

    let (added, removed) = tokio::join!(
        h.engine.add_favorite(&ctx, &fav),
        h.engine.remove_favorite(&ctx, &fav)
    );
    assert!(!added.unwrap().degraded);
    assert!(!removed.unwrap().degraded);

    assert!(!h.engine.is_favorite(&ctx, &fav.key()).unwrap());
    assert!(h.engine.favorites(&ctx).unwrap().is_empty());
    assert!(h.remote.rows(tables::FAVORITES).is_empty());
}

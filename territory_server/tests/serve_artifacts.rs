mod support;

use std::time::Duration;

const PUBLISH_DEADLINE: Duration = Duration::from_secs(15);

#[tokio::test]
async fn when_healthz_is_requested_then_server_answers_ok() {
    let base_url = support::ensure_server();

    let res = reqwest::get(format!("{base_url}/healthz"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(res.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn when_world_map_is_published_then_it_is_served_with_cache_header() {
    let base_url = support::ensure_server();

    let res = support::wait_for_ok(
        &format!("{base_url}/gameTiles/world.map?t=123"),
        PUBLISH_DEADLINE,
    )
    .await;

    assert_eq!(res.headers()[reqwest::header::CACHE_CONTROL], "max-age=60");
    let bytes = res.bytes().await.expect("body");
    // Header, two owners (player 42 then the tribe) and three claims.
    assert_eq!(bytes.len(), 12 + 2 * 16 + 3 * 4);
    assert_eq!(&bytes[0..4], &[2, 0, 1, 0]);
    assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 320);
    assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 64);
    assert_eq!(u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]), 2);
    let first_owner = u64::from_le_bytes(bytes[12..20].try_into().expect("owner id"));
    assert_eq!(first_owner, support::PLAYER_ID);
}

#[tokio::test]
async fn when_world_map_is_published_then_leaderboard_lists_only_tribes() {
    let base_url = support::ensure_server();

    let res = support::wait_for_ok(
        &format!("{base_url}/gameTiles/topTribes.json"),
        PUBLISH_DEADLINE,
    )
    .await;
    let body: serde_json::Value = res.json().await.expect("json body");

    assert_eq!(
        body,
        serde_json::json!([{ "tribeID": support::TRIBE_ID, "index": 0, "count": 2 }])
    );
}

#[tokio::test]
async fn when_tiles_are_enabled_then_root_tile_is_a_png() {
    let base_url = support::ensure_server();

    let res = support::wait_for_ok(
        &format!("{base_url}/territoryTiles/0/0/0.png"),
        PUBLISH_DEADLINE,
    )
    .await;
    let bytes = res.bytes().await.expect("body");

    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    assert!(
        support::workspace()
            .join("www/territoryTiles/1/1/0.png")
            .exists()
    );
}

// Route table for the HTTP API

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::info;
use warp::Filter;

use super::handlers;
use crate::services::registry::Registry;

/// Largest accepted JSON body
const MAX_BODY_BYTES: u64 = 16 * 1024;

fn json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with_registry(
    registry: Arc<Registry>,
) -> impl Filter<Extract = (Arc<Registry>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || registry.clone())
}

/// Build every API route, with CORS and request logging applied
pub fn routes(
    registry: Arc<Registry>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let get_user = warp::path!("api" / "user" / String)
        .and(warp::get())
        .and(with_registry(registry.clone()))
        .and_then(handlers::get_user);

    let auth = warp::path!("api" / "auth")
        .and(warp::post())
        .and(json_body())
        .and(with_registry(registry.clone()))
        .and_then(handlers::auth);

    let start_mining = warp::path!("api" / "mining" / "start")
        .and(warp::post())
        .and(json_body())
        .and(with_registry(registry.clone()))
        .and_then(handlers::start_mining);

    let stop_mining = warp::path!("api" / "mining" / "stop")
        .and(warp::post())
        .and(json_body())
        .and(with_registry(registry.clone()))
        .and_then(handlers::stop_mining);

    let complete_task = warp::path!("api" / "tasks" / "complete")
        .and(warp::post())
        .and(json_body())
        .and(with_registry(registry.clone()))
        .and_then(handlers::complete_task);

    let claim_airdrop = warp::path!("api" / "airdrop" / "claim")
        .and(warp::post())
        .and(json_body())
        .and(with_registry(registry))
        .and_then(handlers::claim_airdrop);

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "success": true })));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    let log = warp::log::custom(|req: warp::log::Info<'_>| {
        info!(
            "{} {} -> {} ({:?})",
            req.method(),
            req.path(),
            req.status().as_u16(),
            req.elapsed()
        );
    });

    get_user
        .or(auth)
        .or(start_mining)
        .or(stop_mining)
        .or(complete_task)
        .or(claim_airdrop)
        .or(health)
        .recover(handlers::handle_rejection)
        .with(cors)
        .with(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;
    use crate::utils::clock::manual::ManualClock;
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use warp::http::StatusCode;
    use warp::hyper::body::Bytes;

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::new(
            Arc::new(MemoryStore::new()),
            vec!["telegram".to_string(), "x".to_string()],
            1.0,
        ))
    }

    fn body(resp: &warp::http::Response<Bytes>) -> Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    async fn post<F>(filter: &F, path: &str, payload: Value) -> warp::http::Response<Bytes>
    where
        F: Filter + 'static,
        F::Extract: warp::Reply + Send,
    {
        warp::test::request()
            .method("POST")
            .path(path)
            .json(&payload)
            .reply(filter)
            .await
    }

    #[tokio::test]
    async fn test_get_user_creates_once() {
        let api = routes(registry());

        let resp = warp::test::request().path("/api/user/u1").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body(&resp);
        assert_eq!(json["success"], true);
        assert_eq!(json["isNew"], true);
        assert_eq!(json["user"]["totalPoints"], 0.0);
        assert_eq!(json["user"]["tasks"]["telegram"], false);

        let resp = warp::test::request().path("/api/user/u1").reply(&api).await;
        let json = body(&resp);
        assert!(json.get("isNew").is_none());
    }

    #[tokio::test]
    async fn test_auth_upserts_profile() {
        let api = routes(registry());
        let resp = post(
            &api,
            "/api/auth",
            json!({ "telegramId": 42, "username": "alice", "email": "a@example.com" }),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body(&resp);
        assert_eq!(json["user"]["id"], "42");
        assert_eq!(json["user"]["username"], "alice");
        assert_eq!(json["user"]["displayName"], "alice");
        assert_eq!(json["user"]["email"], "a@example.com");
    }

    #[tokio::test]
    async fn test_path_id_matches_body_id() {
        let api = routes(registry());
        let resp = post(&api, "/api/auth", json!({ "id": "alice@example", "username": "alice" })).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = warp::test::request()
            .path("/api/user/alice%40example")
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body(&resp);
        assert!(json.get("isNew").is_none());
        assert_eq!(json["user"]["id"], "alice@example");
        assert_eq!(json["user"]["username"], "alice");

        let resp = warp::test::request().path("/api/user/%20").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&resp)["message"], "id is required");
    }

    #[tokio::test]
    async fn test_mining_flow_over_http() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let registry = Arc::new(
            Registry::new(
                Arc::new(MemoryStore::new()),
                vec!["telegram".to_string(), "x".to_string()],
                1.0,
            )
            .with_clock(clock.clone()),
        );
        let api = routes(registry);

        let resp = post(&api, "/api/mining/start", json!({ "id": "u1" })).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&resp)["success"], false);

        post(&api, "/api/auth", json!({ "id": "u1", "username": "u", "email": "" })).await;

        let resp = post(&api, "/api/mining/start", json!({ "id": "u1" })).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        for task in ["telegram", "x"] {
            let resp = post(&api, "/api/tasks/complete", json!({ "id": "u1", "taskKey": task })).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = post(&api, "/api/mining/start", json!({ "id": "u1" })).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(&resp)["user"]["isMining"], true);

        let resp = post(&api, "/api/mining/start", json!({ "id": "u1" })).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        clock.advance(Duration::minutes(30));
        let resp = post(&api, "/api/mining/stop", json!({ "id": "u1" })).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body(&resp);
        assert_eq!(json["pointsGained"], 30.0);
        assert_eq!(json["user"]["isMining"], false);
        assert!(json["user"]["miningStartTime"].is_null());

        let resp = post(&api, "/api/mining/stop", json!({ "id": "u1" })).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let api = routes(registry());
        post(&api, "/api/auth", json!({ "id": "u1" })).await;

        let resp = post(&api, "/api/tasks/complete", json!({ "id": "u1", "taskKey": "discord" })).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&resp)["message"], "Unknown task: discord");
    }

    #[tokio::test]
    async fn test_claim_airdrop() {
        let registry = registry();
        let (mut user, _) = registry.get_or_create_user("u1").await.unwrap();
        user.total_points = 100.0;
        registry.seed(user).await.unwrap();
        let api = routes(registry);

        let resp = post(
            &api,
            "/api/airdrop/claim",
            json!({ "id": "u1", "cost": 150, "destinationAddress": "0xabc" }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = post(
            &api,
            "/api/airdrop/claim",
            json!({ "id": "u1", "cost": -5, "destinationAddress": "0xabc" }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = post(
            &api,
            "/api/airdrop/claim",
            json!({ "id": "u1", "cost": 100, "walletAddress": "0xabc" }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(&resp)["user"]["totalPoints"], 0.0);

        let resp = post(
            &api,
            "/api/airdrop/claim",
            json!({ "id": "ghost", "cost": 1, "destinationAddress": "0xabc" }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let api = routes(registry());
        let resp = warp::test::request()
            .method("POST")
            .path("/api/mining/start")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&api)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body(&resp);
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let api = routes(registry());
        let resp = post(&api, "/api/auth", json!({ "id": "  " })).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&resp)["message"], "id is required");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let api = routes(registry());
        let resp = warp::test::request().path("/api/nope").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&resp)["success"], false);
    }

    #[tokio::test]
    async fn test_health() {
        let api = routes(registry());
        let resp = warp::test::request().path("/health").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(&resp)["success"], true);
    }
}

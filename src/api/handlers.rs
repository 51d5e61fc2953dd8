// HTTP request handlers
// Each handler calls one registry operation and turns the result into JSON

use std::convert::Infallible;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::error;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::error::{ErrorKind, RegistryError};
use crate::services::registry::Registry;

pub type Response = WithStatus<Json>;

/// Identity keys arrive as strings, or as numbers from older clients
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s.trim().to_string(),
        RawId::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(alias = "telegramId", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct MiningRequest {
    #[serde(alias = "telegramId", deserialize_with = "deserialize_id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    #[serde(alias = "telegramId", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(rename = "taskKey")]
    pub task_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    #[serde(alias = "telegramId", deserialize_with = "deserialize_id")]
    pub id: String,
    pub cost: f64,
    #[serde(rename = "destinationAddress", alias = "walletAddress")]
    pub destination_address: String,
}

fn success(body: Value) -> Response {
    warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
}

/// Failure payload: `{success: false, message}`
pub fn failure(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(
        warp::reply::json(&json!({ "success": false, "message": message })),
        status,
    )
}

fn from_error(err: RegistryError) -> Response {
    if err.kind() == ErrorKind::Internal {
        error!("Registry error: {:?}", err);
    }
    failure(err.status(), &err.public_message())
}

fn missing_id() -> Response {
    failure(StatusCode::BAD_REQUEST, "id is required")
}

/// Path ids arrive percent-encoded; decode and trim them like body ids
fn decode_path_id(raw: &str) -> Result<String, Response> {
    let decoded = urlencoding::decode(raw)
        .map_err(|_| failure(StatusCode::BAD_REQUEST, "id is not valid UTF-8"))?;
    let id = decoded.trim();
    if id.is_empty() {
        return Err(missing_id());
    }
    Ok(id.to_string())
}

pub async fn get_user(raw_id: String, registry: Arc<Registry>) -> Result<Response, Infallible> {
    let id = match decode_path_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    Ok(match registry.get_or_create_user(&id).await {
        Ok((user, true)) => success(json!({ "success": true, "user": user, "isNew": true })),
        Ok((user, false)) => success(json!({ "success": true, "user": user })),
        Err(e) => from_error(e),
    })
}

pub async fn auth(body: AuthRequest, registry: Arc<Registry>) -> Result<Response, Infallible> {
    if body.id.is_empty() {
        return Ok(missing_id());
    }

    Ok(
        match registry
            .upsert_identity(&body.id, &body.username, &body.email)
            .await
        {
            Ok(user) => success(json!({ "success": true, "user": user })),
            Err(e) => from_error(e),
        },
    )
}

pub async fn start_mining(
    body: MiningRequest,
    registry: Arc<Registry>,
) -> Result<Response, Infallible> {
    if body.id.is_empty() {
        return Ok(missing_id());
    }

    Ok(match registry.start_mining(&body.id).await {
        Ok(user) => success(json!({ "success": true, "user": user })),
        Err(e) => from_error(e),
    })
}

pub async fn stop_mining(
    body: MiningRequest,
    registry: Arc<Registry>,
) -> Result<Response, Infallible> {
    if body.id.is_empty() {
        return Ok(missing_id());
    }

    Ok(match registry.stop_mining(&body.id).await {
        Ok((user, points_gained)) => success(json!({
            "success": true,
            "pointsGained": points_gained,
            "user": user,
        })),
        Err(e) => from_error(e),
    })
}

pub async fn complete_task(
    body: TaskRequest,
    registry: Arc<Registry>,
) -> Result<Response, Infallible> {
    if body.id.is_empty() {
        return Ok(missing_id());
    }

    Ok(match registry.complete_task(&body.id, &body.task_key).await {
        Ok(user) => success(json!({ "success": true, "user": user })),
        Err(e) => from_error(e),
    })
}

pub async fn claim_airdrop(
    body: ClaimRequest,
    registry: Arc<Registry>,
) -> Result<Response, Infallible> {
    if body.id.is_empty() {
        return Ok(missing_id());
    }

    Ok(
        match registry
            .claim_airdrop(&body.id, body.cost, &body.destination_address)
            .await
        {
            Ok(user) => success(json!({ "success": true, "user": user })),
            Err(e) => from_error(e),
        },
    )
}

/// Turn warp rejections into the same failure payload as registry errors
pub async fn handle_rejection(err: warp::Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Route not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON body".to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "Content-Length header is required".to_string(),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(failure(status, &message))
}

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Airdrop payout requested by a claim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "destinationAddress")]
    pub destination_address: String,
    pub cost: f64,
    #[serde(rename = "requestedAt")]
    pub requested_at: DateTime<Utc>,
}

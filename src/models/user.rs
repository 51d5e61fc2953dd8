// User data model
// Serialized with the camelCase field names the mobile client reads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::config::DEFAULT_REFERRAL_MULTIPLIER;

/// Mining state machine view of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningState {
    Idle,
    Mining,
}

/// Full user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "totalPoints")]
    pub total_points: f64,
    #[serde(rename = "isMining")]
    pub is_mining: bool,
    #[serde(rename = "miningStartTime")]
    pub mining_start_time: Option<DateTime<Utc>>,
    #[serde(rename = "referralMultiplier")]
    pub referral_multiplier: f64,
    pub tasks: BTreeMap<String, bool>,
}

impl User {
    /// Create a new user with default state and every task pending
    pub fn new<S: AsRef<str>>(id: &str, task_keys: &[S]) -> Self {
        let placeholder = format!("user_{}", id);
        Self {
            id: id.to_string(),
            username: placeholder.clone(),
            email: String::new(),
            display_name: placeholder,
            total_points: 0.0,
            is_mining: false,
            mining_start_time: None,
            referral_multiplier: DEFAULT_REFERRAL_MULTIPLIER,
            tasks: task_keys
                .iter()
                .map(|k| (k.as_ref().to_string(), false))
                .collect(),
        }
    }

    /// Demo account the backend can be seeded with
    pub fn demo() -> Self {
        let mut user = Self::new("123456789", &["telegram", "x"]);
        user.username = "testuser".to_string();
        user.display_name = "testuser".to_string();
        user.email = "test@example.com".to_string();
        user.total_points = 1250.5;
        user.referral_multiplier = 1.2;
        user.tasks.insert("telegram".to_string(), true);
        user
    }

    pub fn mining_state(&self) -> MiningState {
        if self.is_mining {
            MiningState::Mining
        } else {
            MiningState::Idle
        }
    }

    /// Whether every task has been completed
    pub fn all_tasks_done(&self) -> bool {
        self.tasks.values().all(|done| *done)
    }

    /// Task keys still pending, in key order
    pub fn pending_tasks(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|(_, done)| !**done)
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

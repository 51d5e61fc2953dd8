// User registry and mining state machine
//
// Every operation runs read -> decide -> mutate -> put while holding the
// user's lock, so concurrent requests for one user never interleave.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::models::payout::PayoutRecord;
use crate::models::user::{MiningState, User};
use crate::services::payout::{LoggingPayoutSink, PayoutSink};
use crate::services::store::UserStore;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::config::Config;
use crate::utils::formatters::{format_duration, format_points};
use crate::utils::points::{calculate_mining_points, elapsed_minutes};

type Result<T> = std::result::Result<T, RegistryError>;

pub struct Registry {
    store: Arc<dyn UserStore>,
    payouts: Arc<dyn PayoutSink>,
    clock: Arc<dyn Clock>,
    task_keys: Vec<String>,
    points_per_minute: f64,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

// Manual Debug impl since the trait objects don't impl Debug
impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("task_keys", &self.task_keys)
            .field("points_per_minute", &self.points_per_minute)
            .finish()
    }
}

impl Registry {
    pub fn new(store: Arc<dyn UserStore>, task_keys: Vec<String>, points_per_minute: f64) -> Self {
        Self {
            store,
            payouts: Arc::new(LoggingPayoutSink),
            clock: Arc::new(SystemClock),
            task_keys,
            points_per_minute,
            locks: DashMap::new(),
        }
    }

    pub fn from_config(store: Arc<dyn UserStore>, config: &Config) -> Self {
        Self::new(store, config.task_keys.clone(), config.points_per_minute)
    }

    #[allow(dead_code)]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[allow(dead_code)]
    pub fn with_payouts(mut self, payouts: Arc<dyn PayoutSink>) -> Self {
        self.payouts = payouts;
        self
    }

    pub fn task_keys(&self) -> &[String] {
        &self.task_keys
    }

    /// Store a prepared record as-is (used for the demo account)
    pub async fn seed(&self, user: User) -> Result<()> {
        let lock = self.lock_for(&user.id);
        let _guard = lock.lock().await;
        self.store.put(&user)?;
        Ok(())
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(id.to_string()).or_default().clone()
    }

    /// Lock for a user that must already exist.
    /// Unknown ids are rejected before a lock entry is created for them.
    fn lock_existing(&self, id: &str) -> Result<Arc<Mutex<()>>> {
        if self.store.get(id)?.is_none() {
            return Err(RegistryError::UserNotFound(id.to_string()));
        }
        Ok(self.lock_for(id))
    }

    fn load(&self, id: &str) -> Result<User> {
        self.store
            .get(id)?
            .ok_or_else(|| RegistryError::UserNotFound(id.to_string()))
    }

    /// Look up a user, creating a default record if absent.
    /// The flag is true when the record was just created.
    pub async fn get_or_create_user(&self, id: &str) -> Result<(User, bool)> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let (user, created) = self.store.upsert(id, User::new(id, &self.task_keys))?;
        if created {
            info!("Created user {}", id);
        }
        Ok((user, created))
    }

    /// Create the user if needed, then overwrite its profile fields
    pub async fn upsert_identity(&self, id: &str, username: &str, email: &str) -> Result<User> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let (mut user, created) = self.store.upsert(id, User::new(id, &self.task_keys))?;
        user.username = username.to_string();
        user.email = email.to_string();
        user.display_name = username.to_string();
        self.store.put(&user)?;

        debug!("Identity upserted for {} (new: {})", id, created);
        Ok(user)
    }

    pub async fn start_mining(&self, id: &str) -> Result<User> {
        let lock = self.lock_existing(id)?;
        let _guard = lock.lock().await;

        let mut user = self.load(id)?;

        if user.mining_state() == MiningState::Mining {
            debug!("Start rejected for {}: already mining", id);
            return Err(RegistryError::AlreadyMining);
        }

        if !user.all_tasks_done() {
            let pending = user.pending_tasks().into_iter().map(String::from).collect();
            debug!("Start rejected for {}: tasks incomplete", id);
            return Err(RegistryError::TasksIncomplete(pending));
        }

        user.is_mining = true;
        user.mining_start_time = Some(self.clock.now());
        self.store.put(&user)?;

        info!("Mining started for {}", id);
        Ok(user)
    }

    /// Stop the active session and credit its points.
    /// Returns the updated user and the points gained by this session.
    pub async fn stop_mining(&self, id: &str) -> Result<(User, f64)> {
        let lock = self.lock_existing(id)?;
        let _guard = lock.lock().await;

        let mut user = self.load(id)?;

        if user.mining_state() == MiningState::Idle {
            debug!("Stop rejected for {}: not mining", id);
            return Err(RegistryError::NotMining);
        }

        let now = self.clock.now();
        let started = user.mining_start_time.unwrap_or(now);
        let points_gained = calculate_mining_points(started, now, self.points_per_minute);

        user.total_points += points_gained;
        user.is_mining = false;
        user.mining_start_time = None;
        self.store.put(&user)?;

        info!(
            "Mining stopped for {} after {}: +{} points",
            id,
            format_duration(elapsed_minutes(started, now)),
            format_points(points_gained)
        );
        Ok((user, points_gained))
    }

    pub async fn complete_task(&self, id: &str, task_key: &str) -> Result<User> {
        let lock = self.lock_existing(id)?;
        let _guard = lock.lock().await;

        let mut user = self.load(id)?;

        match user.tasks.get(task_key).copied() {
            Some(true) => return Ok(user),
            Some(false) => {
                user.tasks.insert(task_key.to_string(), true);
            }
            None => {
                debug!("Unknown task {} for {}", task_key, id);
                return Err(RegistryError::UnknownTask(task_key.to_string()));
            }
        }
        self.store.put(&user)?;

        info!("Task {} completed by {}", task_key, id);
        Ok(user)
    }

    /// Deduct `cost` points and hand the payout to the sink.
    /// Nothing is deducted if the sink fails.
    pub async fn claim_airdrop(
        &self,
        id: &str,
        cost: f64,
        destination_address: &str,
    ) -> Result<User> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(RegistryError::InvalidCost(cost));
        }
        let destination_address = destination_address.trim();
        if destination_address.is_empty() {
            return Err(RegistryError::MissingDestination);
        }

        let lock = self.lock_existing(id)?;
        let _guard = lock.lock().await;

        let mut user = self.load(id)?;

        if user.total_points < cost {
            debug!("Claim rejected for {}: insufficient points", id);
            return Err(RegistryError::InsufficientPoints {
                needed: cost,
                available: user.total_points,
            });
        }

        let record = PayoutRecord {
            user_id: id.to_string(),
            destination_address: destination_address.to_string(),
            cost,
            requested_at: self.clock.now(),
        };
        self.payouts.dispatch(&record).map_err(RegistryError::Payout)?;

        user.total_points -= cost;
        self.store.put(&user)?;

        Ok(user)
    }
}

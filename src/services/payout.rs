// Airdrop payout dispatch
// No real transfer happens here: the logging sink records the request

use anyhow::Result;
use tracing::info;

use crate::models::payout::PayoutRecord;
use crate::utils::formatters::{format_points, mask_address};

/// Receiver of airdrop payouts
pub trait PayoutSink: Send + Sync {
    fn dispatch(&self, record: &PayoutRecord) -> Result<()>;
}

/// Emits every payout as a structured log entry
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPayoutSink;

impl PayoutSink for LoggingPayoutSink {
    fn dispatch(&self, record: &PayoutRecord) -> Result<()> {
        info!(
            user_id = %record.user_id,
            destination = %record.destination_address,
            cost = record.cost,
            requested_at = %record.requested_at.to_rfc3339(),
            "Airdrop payout to {}: {} points",
            mask_address(&record.destination_address),
            format_points(record.cost)
        );
        Ok(())
    }
}

// Data models
pub mod payout;
pub mod user;

// Domain services
pub mod payout;
pub mod registry;
pub mod store;

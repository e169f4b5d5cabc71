pub mod order_service;
pub mod reconciliation;
pub mod wallet_service;

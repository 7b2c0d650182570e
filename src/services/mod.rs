pub mod auth_service;
pub mod failure_cache;
pub mod position_service;
pub mod price_service;
pub mod summary_service;
pub mod transaction_service;

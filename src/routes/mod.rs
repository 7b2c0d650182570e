pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod summary;
pub(crate) mod transactions;

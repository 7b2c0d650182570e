use std::sync::Arc;

use crate::external::price_provider::PriceProvider;
use crate::services::auth_service::AuthService;
use crate::services::failure_cache::FailureCache;
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub failure_cache: FailureCache,
    pub auth: Arc<AuthService>,
}

use std::sync::Arc;

use crate::config::Config;
use crate::ranking::service::RankingService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Holds the provider adapter. Stateless per request, safe to share.
    pub ranker: Arc<RankingService>,
}

#[cfg(test)]
impl AppState {
    /// State backed by an in-memory provider, for router tests.
    pub fn for_tests(provider: Arc<crate::similarity::stub::StubProvider>) -> Self {
        let config = Config::for_tests();
        let ranker = RankingService::new(
            provider,
            config.max_concurrent_scoring,
            config.provider_timeout,
        );
        Self {
            config,
            ranker: Arc::new(ranker),
        }
    }
}

//! Wiring of feed and engagement ports into HTTP state.
//!
//! With a database pool every driven port is backed by PostgreSQL; without
//! one a single shared in-memory store serves the catalogue, statistics and
//! engagement writes so that recorded views and ratings show up in feeds.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use feed_backend::domain::engagement::EngagementService;
use feed_backend::domain::feed::FeedService;
use feed_backend::domain::ports::{
    ContentCatalogue, EngagementCommand, EngagementRepository, EngagementStatistics, FeedQuery,
};
use feed_backend::inbound::http::state::HttpState;
use feed_backend::outbound::memory::InMemoryFeedStore;
use feed_backend::outbound::persistence::{
    DbPool, DieselContentCatalogue, DieselEngagementRepository, DieselEngagementStatistics,
};

use super::ServerConfig;

/// Driven adapters backing the feed and engagement services.
struct DrivenPorts<C: ?Sized, S: ?Sized, R: ?Sized> {
    catalogue: Arc<C>,
    statistics: Arc<S>,
    repository: Arc<R>,
}

impl<C, S, R> DrivenPorts<C, S, R>
where
    C: ContentCatalogue + 'static,
    S: EngagementStatistics + 'static,
    R: EngagementRepository + 'static,
{
    fn into_state(self, config: &ServerConfig, clock: Arc<dyn Clock>) -> HttpState {
        let feed: Arc<dyn FeedQuery> = Arc::new(FeedService::new(
            Arc::clone(&self.catalogue),
            self.statistics,
        ));
        let engagement: Arc<dyn EngagementCommand> = Arc::new(
            EngagementService::new(self.repository, self.catalogue, clock)
                .with_cooldowns(config.cooldowns),
        );
        HttpState::new(feed, engagement).with_default_limit(config.default_limit)
    }
}

fn diesel_ports(
    pool: &DbPool,
) -> DrivenPorts<DieselContentCatalogue, DieselEngagementStatistics, DieselEngagementRepository> {
    DrivenPorts {
        catalogue: Arc::new(DieselContentCatalogue::new(pool.clone())),
        statistics: Arc::new(DieselEngagementStatistics::new(pool.clone())),
        repository: Arc::new(DieselEngagementRepository::new(pool.clone())),
    }
}

fn memory_ports(
    store: Arc<InMemoryFeedStore>,
) -> DrivenPorts<InMemoryFeedStore, InMemoryFeedStore, InMemoryFeedStore> {
    DrivenPorts {
        catalogue: Arc::clone(&store),
        statistics: Arc::clone(&store),
        repository: store,
    }
}

/// Build the shared HTTP state, choosing adapters from the configuration.
pub(crate) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    build_http_state_with_clock(config, Arc::new(DefaultClock))
}

fn build_http_state_with_clock(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> web::Data<HttpState> {
    let state = match &config.db_pool {
        Some(pool) => diesel_ports(pool).into_state(config, clock),
        None => memory_ports(Arc::new(InMemoryFeedStore::default())).into_state(config, clock),
    };
    web::Data::new(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::{Key, SameSite};
    use feed_backend::domain::UserId;
    use feed_backend::domain::engagement::Rating;
    use feed_backend::domain::feed::{
        ContentItem, ContentItemId, FeedFilters, ProcessingStatus, Visibility,
    };
    use feed_backend::domain::ports::FeedPageRequest;
    use pagination::PageLimit;
    use rstest::rstest;

    fn config() -> ServerConfig {
        ServerConfig::new(
            Key::generate(),
            false,
            SameSite::Lax,
            "127.0.0.1:0".parse().expect("socket addr"),
        )
        .with_default_limit(PageLimit::new(5).expect("limit"))
    }

    #[rstest]
    fn memory_state_carries_default_limit() {
        let state = build_http_state(&config());
        assert_eq!(state.default_limit.get(), 5);
    }

    #[rstest]
    #[actix_web::test]
    async fn memory_store_is_shared_between_reads_and_writes() {
        let store = Arc::new(InMemoryFeedStore::default());
        let owner = UserId::random();
        let viewer = UserId::random();
        let now = DefaultClock.utc();
        let item_id = ContentItemId::random();
        store
            .upsert_item(ContentItem {
                id: item_id,
                owner_id: owner,
                visibility: Visibility::Public,
                status: ProcessingStatus::Completed,
                category_id: None,
                title: Some("Shared store".to_owned()),
                description: None,
                created_at: now,
                updated_at: now,
            })
            .expect("seed item");
        let state = memory_ports(store).into_state(&config(), Arc::new(DefaultClock));

        state
            .engagement
            .rate_item(&item_id, &viewer, Rating::new(4).expect("rating"))
            .await
            .expect("rating recorded");

        let page = state
            .feed
            .fetch_page(&FeedPageRequest {
                filters: FeedFilters::default(),
                cursor: None,
                limit: PageLimit::default(),
            })
            .await
            .expect("feed page");
        let entry = page.entries.first().expect("one entry");
        assert_eq!(entry.statistics.rating_count, 1);
    }
}

//! Tests for the feed page fetcher.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pagination::PageLimit;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use uuid::Uuid;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::feed::{
    FeedPosition, PopularitySignals, ProcessingStatus, RatingSummary, Visibility, score_item,
};
use crate::domain::ports::{
    FixtureEngagementStatistics, MockContentCatalogue, MockEngagementStatistics,
};

/// A stored item with the engagement totals that feed its score.
#[derive(Debug, Clone)]
struct StubRow {
    item: ContentItem,
    view_count: i64,
    ratings: RatingSummary,
}

/// Catalogue over a fixed set of rows that applies predicates, scoring and the
/// resume position the way a storage adapter must.
#[derive(Debug, Default)]
struct StubCatalogue {
    rows: Vec<StubRow>,
}

impl StubCatalogue {
    fn with_items(items: impl IntoIterator<Item = ContentItem>) -> Self {
        Self {
            rows: items
                .into_iter()
                .map(|item| StubRow {
                    item,
                    view_count: 0,
                    ratings: RatingSummary::default(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ContentCatalogue for StubCatalogue {
    async fn fetch_recent(
        &self,
        request: &RecentItemsRequest,
    ) -> Result<Vec<ContentItem>, ContentCatalogueError> {
        let mut items: Vec<ContentItem> = self
            .rows
            .iter()
            .map(|row| row.item.clone())
            .filter(|item| FeedPredicate::all_match(&request.predicates, item))
            .filter(|item| {
                request
                    .after
                    .as_ref()
                    .is_none_or(|after| RecencyPosition::of(item).is_after(after))
            })
            .collect();
        items.sort_by(|a, b| RecencyPosition::of(a).feed_cmp(&RecencyPosition::of(b)));
        items.truncate(request.limit);
        Ok(items)
    }

    async fn search_page(
        &self,
        request: &SearchPageRequest,
    ) -> Result<Vec<ScoredItem>, ContentCatalogueError> {
        let scored = self
            .rows
            .iter()
            .filter(|row| FeedPredicate::all_match(&request.predicates, &row.item))
            .filter_map(|row| {
                let signals = PopularitySignals::new(row.view_count, row.ratings);
                score_item(&request.query, &row.item, signals).map(|score| ScoredItem {
                    item: row.item.clone(),
                    score,
                })
            })
            .collect();
        Ok(request.select(scored))
    }

    async fn find_item(
        &self,
        item_id: &ContentItemId,
    ) -> Result<Option<ContentItem>, ContentCatalogueError> {
        Ok(self
            .rows
            .iter()
            .find(|row| &row.item.id == item_id)
            .map(|row| row.item.clone()))
    }
}

type StubService = FeedService<StubCatalogue, FixtureEngagementStatistics>;

fn service(catalogue: StubCatalogue) -> StubService {
    FeedService::new(Arc::new(catalogue), Arc::new(FixtureEngagementStatistics))
}

fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, n, 12, 0, 0)
        .single()
        .expect("valid fixture date")
}

fn id(n: u128) -> ContentItemId {
    ContentItemId::from_uuid(Uuid::from_u128(n))
}

fn limit(value: i64) -> PageLimit {
    PageLimit::new(value).expect("fixture limit")
}

fn item(item_id: ContentItemId, updated_at: DateTime<Utc>) -> ContentItem {
    ContentItem {
        id: item_id,
        owner_id: UserId::random(),
        visibility: Visibility::Public,
        status: ProcessingStatus::Completed,
        category_id: None,
        title: None,
        description: None,
        created_at: updated_at,
        updated_at,
    }
}

fn titled(item_id: ContentItemId, updated_at: DateTime<Utc>, title: &str) -> ContentItem {
    ContentItem {
        title: Some(title.to_owned()),
        ..item(item_id, updated_at)
    }
}

fn request(filters: FeedFilters, cursor: Option<String>, page_limit: PageLimit) -> FeedPageRequest {
    FeedPageRequest {
        filters,
        cursor,
        limit: page_limit,
    }
}

fn search(mode: FeedMode, query: &str) -> FeedFilters {
    FeedFilters {
        mode,
        query: SearchQuery::parse(query),
        ..FeedFilters::default()
    }
}

fn ids(page: &FeedPage) -> Vec<ContentItemId> {
    page.entries.iter().map(|entry| entry.item.id).collect()
}

/// Follow `next_cursor` until the feed is exhausted, returning every page.
async fn sweep<C, S>(
    service: &FeedService<C, S>,
    filters: &FeedFilters,
    page_limit: PageLimit,
    max_pages: usize,
) -> Vec<FeedPage>
where
    C: ContentCatalogue + ?Sized,
    S: EngagementStatistics + ?Sized,
{
    let mut pages = Vec::new();
    let mut cursor = None;
    loop {
        let page = service
            .fetch_page(&request(filters.clone(), cursor, page_limit))
            .await
            .expect("page fetch succeeds");
        cursor = page.next_cursor.clone();
        pages.push(page);
        assert!(pages.len() <= max_pages, "sweep did not terminate");
        if cursor.is_none() {
            return pages;
        }
    }
}

#[rstest]
#[tokio::test]
async fn pages_walk_newest_first_until_exhausted() {
    let catalogue = StubCatalogue::with_items((1..=5).map(|n| item(id(n.into()), day(n))));
    let service = service(catalogue);

    let pages = sweep(&service, &FeedFilters::default(), limit(2), 10).await;

    let seen: Vec<Vec<ContentItemId>> = pages.iter().map(ids).collect();
    assert_eq!(
        seen,
        vec![vec![id(5), id(4)], vec![id(3), id(2)], vec![id(1)]]
    );
    assert!(pages.last().is_some_and(|page| page.next_cursor.is_none()));
}

#[rstest]
#[tokio::test]
async fn exact_multiple_of_limit_ends_without_cursor() {
    let catalogue = StubCatalogue::with_items((1..=4).map(|n| item(id(n.into()), day(n))));
    let pages = sweep(&service(catalogue), &FeedFilters::default(), limit(2), 10).await;
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|page| page.entries.len() == 2));
}

#[rstest]
#[tokio::test]
async fn identical_timestamps_break_ties_by_identifier() {
    let shared = day(10);
    let catalogue = StubCatalogue::with_items([
        item(id(0xa), shared),
        item(id(0xc), shared),
        item(id(0xb), shared),
    ]);
    let pages = sweep(&service(catalogue), &FeedFilters::default(), limit(1), 10).await;
    let seen: Vec<ContentItemId> = pages.iter().flat_map(ids).collect();
    assert_eq!(seen, vec![id(0xc), id(0xb), id(0xa)]);
}

#[rstest]
#[tokio::test]
async fn ineligible_items_never_appear() {
    let mut private = item(id(3), day(3));
    private.visibility = Visibility::Private;
    let mut processing = item(id(2), day(2));
    processing.status = ProcessingStatus::Processing;
    let catalogue = StubCatalogue::with_items([private, processing, item(id(1), day(1))]);

    let page = service(catalogue)
        .fetch_page(&request(FeedFilters::default(), None, limit(10)))
        .await
        .expect("page");

    assert_eq!(ids(&page), vec![id(1)]);
    assert!(page.next_cursor.is_none());
}

#[rstest]
#[case::garbage(Some("%%%not-a-cursor%%%"))]
#[case::empty(Some(""))]
#[tokio::test]
async fn malformed_cursor_restarts_from_first_page(#[case] cursor: Option<&str>) {
    let catalogue = StubCatalogue::with_items((1..=3).map(|n| item(id(n.into()), day(n))));
    let page = service(catalogue)
        .fetch_page(&request(
            FeedFilters::default(),
            cursor.map(str::to_owned),
            limit(2),
        ))
        .await
        .expect("page");
    assert_eq!(ids(&page), vec![id(3), id(2)]);
}

#[rstest]
#[tokio::test]
async fn cursor_from_another_order_restarts_from_first_page() {
    let catalogue = StubCatalogue::with_items((1..=3).map(|n| titled(id(n.into()), day(n), "cats")));
    let service = service(catalogue);
    let relevance_page = service
        .fetch_page(&request(search(FeedMode::Relevance, "cats"), None, limit(1)))
        .await
        .expect("relevance page");
    let foreign = relevance_page.next_cursor.expect("more relevance results");

    let page = service
        .fetch_page(&request(FeedFilters::default(), Some(foreign), limit(2)))
        .await
        .expect("recency page");
    assert_eq!(ids(&page), vec![id(3), id(2)]);
}

#[rstest]
#[tokio::test]
async fn relevance_without_query_serves_recency() {
    let catalogue = StubCatalogue::with_items((1..=3).map(|n| item(id(n.into()), day(n))));
    let filters = FeedFilters {
        mode: FeedMode::Relevance,
        ..FeedFilters::default()
    };
    let page = service(catalogue)
        .fetch_page(&request(filters, None, limit(3)))
        .await
        .expect("page");
    assert_eq!(ids(&page), vec![id(3), id(2), id(1)]);
    assert!(page.entries.iter().all(|entry| entry.score.is_none()));
}

#[rstest]
#[tokio::test]
async fn relevance_ranks_stronger_matches_first() {
    let mut described = item(id(1), day(9));
    described.description = Some("all about cats".to_owned());
    let catalogue = StubCatalogue::with_items([
        described,
        titled(id(2), day(1), "Cats"),
        titled(id(3), day(5), "Dogs"),
        titled(id(4), day(3), "Catsup recipes"),
    ]);

    let page = service(catalogue)
        .fetch_page(&request(search(FeedMode::Relevance, "cats"), None, limit(10)))
        .await
        .expect("page");

    assert_eq!(ids(&page), vec![id(2), id(1), id(4)]);
    let scores: Vec<f64> = page
        .entries
        .iter()
        .filter_map(|entry| entry.score.map(RelevanceScore::value))
        .collect();
    assert_eq!(scores, vec![13.0, 5.0, 3.0]);
}

#[rstest]
#[tokio::test]
async fn recency_mode_with_query_keeps_matches_in_time_order() {
    let catalogue = StubCatalogue::with_items([
        titled(id(1), day(1), "cats"),
        titled(id(2), day(2), "dogs"),
        titled(id(3), day(3), "more cats"),
    ]);
    let page = service(catalogue)
        .fetch_page(&request(search(FeedMode::Recency, "cats"), None, limit(10)))
        .await
        .expect("page");
    assert_eq!(ids(&page), vec![id(3), id(1)]);
    assert!(page.entries.iter().all(|entry| entry.score.is_some()));
}

fn random_catalogue(rng: &mut SmallRng, size: usize) -> StubCatalogue {
    const TITLES: [&str; 5] = ["cats", "dogs and cats", "birds", "cat videos", "Cats at play"];
    let base = day(1);
    let rows = (0..size)
        .map(|_| {
            let mut entry = titled(
                ContentItemId::from_uuid(Uuid::from_u128(rng.r#gen::<u128>())),
                base + Duration::minutes(rng.gen_range(0..6)),
                TITLES[rng.gen_range(0..TITLES.len())],
            );
            if rng.gen_bool(0.15) {
                entry.visibility = Visibility::Private;
            }
            if rng.gen_bool(0.1) {
                entry.status = ProcessingStatus::Failed;
            }
            // Repeat a few engagement profiles so equal fractional scores occur.
            let profile = rng.gen_range(0..4_i64);
            let count = if profile == 0 { 0 } else { 3 + profile * 2 };
            StubRow {
                item: entry,
                view_count: if rng.gen_bool(0.5) {
                    profile * 333_333
                } else {
                    rng.gen_range(0..2_000_000)
                },
                ratings: RatingSummary {
                    count,
                    sum: if count == 0 {
                        0
                    } else {
                        rng.gen_range(count..=count * 5)
                    },
                },
            }
        })
        .collect();
    StubCatalogue { rows }
}

#[rstest]
#[tokio::test]
async fn recency_sweeps_visit_each_item_exactly_once() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    for _ in 0..40 {
        let size = rng.gen_range(0..30);
        let catalogue = random_catalogue(&mut rng, size);
        let mut expected: Vec<ContentItem> = catalogue
            .rows
            .iter()
            .map(|row| row.item.clone())
            .filter(ContentItem::is_eligible)
            .collect();
        expected.sort_by(|a, b| RecencyPosition::of(a).feed_cmp(&RecencyPosition::of(b)));
        let expected: Vec<ContentItemId> = expected.iter().map(|item| item.id).collect();

        let page_limit = limit(rng.gen_range(1..=7));
        let pages = sweep(&service(catalogue), &FeedFilters::default(), page_limit, size + 2).await;
        let seen: Vec<ContentItemId> = pages.iter().flat_map(ids).collect();

        assert_eq!(seen, expected);
        assert!(
            pages
                .iter()
                .all(|page| page.entries.len() <= page_limit.as_usize())
        );
    }
}

#[rstest]
#[tokio::test]
async fn relevance_sweeps_visit_each_match_exactly_once() {
    let mut rng = SmallRng::seed_from_u64(0xfeed);
    let query = SearchQuery::parse("cats").expect("query");
    for _ in 0..40 {
        let size = rng.gen_range(0..30);
        let catalogue = random_catalogue(&mut rng, size);
        let mut expected: Vec<RelevancePosition> = catalogue
            .rows
            .iter()
            .filter(|row| row.item.is_eligible())
            .filter_map(|row| {
                let signals = PopularitySignals::new(row.view_count, row.ratings);
                score_item(&query, &row.item, signals)
                    .map(|score| RelevancePosition::new(score, row.item.id))
            })
            .collect();
        expected.sort_by(FeedPosition::feed_cmp);
        let expected: Vec<ContentItemId> = expected.iter().map(|position| position.id).collect();

        let page_limit = limit(rng.gen_range(1..=7));
        let pages = sweep(
            &service(catalogue),
            &search(FeedMode::Relevance, "cats"),
            page_limit,
            size + 2,
        )
        .await;
        let seen: Vec<ContentItemId> = pages.iter().flat_map(ids).collect();

        assert_eq!(seen, expected);
    }
}

#[rstest]
#[tokio::test]
async fn relevance_sweep_terminates_on_fractional_scores() {
    let popular = |n: u128| StubRow {
        item: titled(id(n), day(1), "cats"),
        view_count: 1_000_000,
        ratings: RatingSummary { count: 7, sum: 22 },
    };
    let catalogue = StubCatalogue {
        rows: vec![popular(1), popular(2)],
    };

    let pages = sweep(
        &service(catalogue),
        &search(FeedMode::Relevance, "cats"),
        limit(1),
        4,
    )
    .await;

    let seen: Vec<ContentItemId> = pages.iter().flat_map(ids).collect();
    assert_eq!(seen, vec![id(2), id(1)]);
}

#[rstest]
#[tokio::test]
async fn search_passes_lookahead_order_and_query_to_catalogue() {
    let resume = RelevancePosition::new(RelevanceScore::new(16.0 + 22.0 / 7.0), id(7));
    let cursor = FeedCursorKey::relevance(resume).encode().expect("encode");
    let mut catalogue = MockContentCatalogue::new();
    catalogue
        .expect_search_page()
        .withf(move |req| {
            req.limit == 4
                && req.order == SearchOrder::Relevance { after: Some(resume) }
                && req.query.phrase() == "cats"
                && !req
                    .predicates
                    .iter()
                    .any(|predicate| matches!(predicate, FeedPredicate::MentionsText(_)))
        })
        .times(1)
        .returning(|_| Ok(Vec::new()));
    let service = FeedService::new(Arc::new(catalogue), Arc::new(FixtureEngagementStatistics));

    let page = service
        .fetch_page(&request(
            search(FeedMode::Relevance, "cats"),
            Some(cursor),
            limit(3),
        ))
        .await
        .expect("page");
    assert!(page.entries.is_empty());
    assert!(page.next_cursor.is_none());
}

#[rstest]
#[case(1)]
#[case(100)]
#[tokio::test]
async fn limit_bounds_are_honoured(#[case] value: i64) {
    let catalogue =
        StubCatalogue::with_items((0..150).map(|n| item(id(n + 1), day(1) + Duration::seconds(n as i64))));
    let page = service(catalogue)
        .fetch_page(&request(FeedFilters::default(), None, limit(value)))
        .await
        .expect("page");
    assert_eq!(page.entries.len() as i64, value);
    assert!(page.next_cursor.is_some());
}

#[rstest]
#[tokio::test]
async fn statistics_are_resolved_for_the_returned_page_only() {
    let catalogue = StubCatalogue::with_items((1..=5).map(|n| item(id(n.into()), day(n))));
    let mut statistics = MockEngagementStatistics::new();
    statistics
        .expect_snapshot()
        .withf(|query| query.item_ids == vec![id(5), id(4)])
        .times(1)
        .returning(|_| {
            let mut snapshot = crate::domain::feed::StatisticsSnapshot::default();
            snapshot.view_counts.insert(id(5), 42);
            Ok(snapshot)
        });
    let service = FeedService::new(Arc::new(catalogue), Arc::new(statistics));

    let page = service
        .fetch_page(&request(FeedFilters::default(), None, limit(2)))
        .await
        .expect("page");

    let views: Vec<i64> = page
        .entries
        .iter()
        .map(|entry| entry.statistics.view_count)
        .collect();
    assert_eq!(views, vec![42, 0]);
}

#[rstest]
#[case(ContentCatalogueError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(ContentCatalogueError::query("syntax"), ErrorCode::InternalError)]
#[tokio::test]
async fn catalogue_failures_map_to_domain_errors(
    #[case] failure: ContentCatalogueError,
    #[case] expected: ErrorCode,
) {
    let mut catalogue = MockContentCatalogue::new();
    catalogue
        .expect_fetch_recent()
        .times(1)
        .return_once(move |_| Err(failure));
    let service = FeedService::new(Arc::new(catalogue), Arc::new(FixtureEngagementStatistics));

    let err = service
        .fetch_page(&request(FeedFilters::default(), None, limit(2)))
        .await
        .expect_err("catalogue failure");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn catalogue_receives_lookahead_and_resume_position() {
    let resume = RecencyPosition::new(day(4), id(4));
    let cursor = FeedCursorKey::recency(resume).encode().expect("encode");
    let mut catalogue = MockContentCatalogue::new();
    catalogue
        .expect_fetch_recent()
        .withf(move |req| req.limit == 3 && req.after == Some(resume))
        .times(1)
        .returning(|_| Ok(Vec::new()));
    let service = FeedService::new(Arc::new(catalogue), Arc::new(FixtureEngagementStatistics));

    let page = service
        .fetch_page(&request(FeedFilters::default(), Some(cursor), limit(2)))
        .await
        .expect("page");
    assert!(page.entries.is_empty());
    assert!(page.next_cursor.is_none());
}

#[rstest]
#[tokio::test]
async fn private_items_are_hidden_from_other_viewers() {
    let mut private = item(id(1), day(1));
    private.visibility = Visibility::Private;
    let owner = private.owner_id;
    let service = service(StubCatalogue::with_items([private]));

    let err = service
        .fetch_item(&id(1), Some(UserId::random()))
        .await
        .expect_err("hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let entry = service
        .fetch_item(&id(1), Some(owner))
        .await
        .expect("owner sees item");
    assert_eq!(entry.item.id, id(1));
    assert_eq!(entry.statistics.viewer_is_following_owner, Some(false));
}

#[rstest]
#[tokio::test]
async fn missing_items_are_not_found() {
    let err = service(StubCatalogue::default())
        .fetch_item(&id(9), None)
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

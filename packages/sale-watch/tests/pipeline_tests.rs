use chrono::{TimeZone, Utc};
use sale_watch::testing::{listing_page, MockPageFetcher, MockPushService, SaleRow};
use sale_watch::{Config, PushOutcome, SaleWatch, SaleWatchError, SeenStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const TERM: &str = "2024/01/01-01/07";

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    _dir: TempDir,
    config: Config,
    fetcher: MockPageFetcher,
    push: MockPushService,
}

impl Harness {
    fn new(fetcher: MockPageFetcher) -> Self {
        Self::with_push(fetcher, MockPushService::new())
    }

    fn with_push(fetcher: MockPageFetcher, push: MockPushService) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = Config::new("test-token", "U-recipient");
        config.seen_db_path = dir.path().join("seen.db");

        Self {
            _dir: dir,
            config,
            fetcher,
            push,
        }
    }

    fn watch(&self) -> SaleWatch {
        SaleWatch::new(
            self.config.clone(),
            Arc::new(self.fetcher.clone()),
            Arc::new(self.push.clone()),
        )
    }

    fn db_path(&self) -> &Path {
        &self.config.seen_db_path
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_only_keyword_matched_store_is_delivered() {
    let h = Harness::new(MockPageFetcher::new().with_page(listing_page(&[
        SaleRow::new("浦和店", TERM),
        SaleRow::new("渋谷店", TERM),
    ])));

    let summary = h.watch().run_once(now()).await.unwrap();

    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.new, 1);
    assert_eq!(summary.outcome, PushOutcome::Delivered { count: 1 });

    let sent = h.push.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "U-recipient");
    assert!(sent[0].1.contains("🛒 浦和店"));
    assert!(!sent[0].1.contains("渋谷店"));

    let store = SeenStore::open(h.db_path()).await.unwrap();
    assert!(store.contains("浦和店_2024/01/01-01/07").await.unwrap());
    assert_eq!(store.count().await.unwrap(), 1);
    store.close().await;
}

#[tokio::test]
async fn test_rerun_with_unchanged_page_pushes_nothing() {
    let h = Harness::new(
        MockPageFetcher::new().with_page(listing_page(&[SaleRow::new("浦和店", TERM)])),
    );
    let watch = h.watch();

    watch.run_once(now()).await.unwrap();
    let second = watch.run_once(now()).await.unwrap();

    assert_eq!(second.extracted, 1);
    assert_eq!(second.new, 0);
    assert_eq!(second.outcome, PushOutcome::NothingNew);
    assert_eq!(h.push.push_count(), 1, "second run must not push");
    assert_eq!(h.fetcher.calls().len(), 2, "each run re-fetches");
}

#[tokio::test]
async fn test_previously_seen_listing_is_not_pushed() {
    let h = Harness::new(
        MockPageFetcher::new().with_page(listing_page(&[SaleRow::new("浦和店", TERM)])),
    );

    // Seen set already holds the key from a prior run.
    let store = SeenStore::open(h.db_path()).await.unwrap();
    let prior = sale_watch::ListingRecord {
        id: "浦和店_2024/01/01-01/07".to_string(),
        body: "old".to_string(),
        page_url: url::Url::parse("https://map.kaldi.co.jp/kaldi/articleList").unwrap(),
    };
    store.diff_since_last_run(&[prior]).await.unwrap();
    store.close().await;

    let summary = h.watch().run_once(now()).await.unwrap();

    assert_eq!(summary.outcome, PushOutcome::NothingNew);
    assert_eq!(h.push.push_count(), 0);
}

#[tokio::test]
async fn test_combined_message_keeps_document_order() {
    let h = Harness::new(MockPageFetcher::new().with_page(listing_page(&[
        SaleRow::new("赤羽店", TERM).detail("A詳細"),
        SaleRow::new("川口店", TERM).detail("B詳細"),
    ])));

    h.watch().run_once(now()).await.unwrap();

    let text = &h.push.sent()[0].1;
    let page_url = &h.fetcher.calls()[0];
    let expected = format!(
        "☕️ KALDIの新着セール情報が届いたよ！\n\n\
         🛒 赤羽店\n赤羽店の住所\nセール（{TERM}）\nA詳細\n\n\
         🛒 川口店\n川口店の住所\nセール（{TERM}）\nB詳細\n\n\
         🔗 一覧ページはこちら\n{page_url}"
    );
    assert_eq!(text, &expected);
}

#[tokio::test]
async fn test_only_new_listings_are_pushed_on_later_run() {
    let h = Harness::new(
        MockPageFetcher::new()
            .with_page(listing_page(&[SaleRow::new("浦和店", TERM)]))
            .with_page(listing_page(&[
                SaleRow::new("浦和店", TERM).detail("内容が変わった"),
                SaleRow::new("浦和店", "2024/02/01-02/07"),
            ])),
    );
    let watch = h.watch();

    watch.run_once(now()).await.unwrap();
    let second = watch.run_once(now()).await.unwrap();

    assert_eq!(second.outcome, PushOutcome::Delivered { count: 1 });
    let text = &h.push.sent()[1].1;
    assert!(text.contains("2024/02/01-02/07"));
    assert!(!text.contains("内容が変わった"));
}

#[tokio::test]
async fn test_no_matching_rows_is_not_an_error() {
    let h = Harness::new(
        MockPageFetcher::new().with_page(listing_page(&[SaleRow::new("渋谷店", TERM)])),
    );

    let summary = h.watch().run_once(now()).await.unwrap();

    assert_eq!(summary.extracted, 0);
    assert_eq!(summary.outcome, PushOutcome::NothingNew);
    assert_eq!(h.push.push_count(), 0);
}

#[tokio::test]
async fn test_malformed_row_aborts_before_seen_set_changes() {
    let h = Harness::new(MockPageFetcher::new().with_page(listing_page(&[
        SaleRow::new("浦和店", TERM),
        SaleRow::new("赤羽店", TERM).without_term(),
    ])));

    let err = h.watch().run_once(now()).await.unwrap_err();

    assert!(matches!(err, SaleWatchError::MalformedRow { field: "term", .. }));
    assert_eq!(h.push.push_count(), 0);
    assert!(
        !h.db_path().exists(),
        "store must not be touched when extraction fails"
    );
}

#[tokio::test]
async fn test_fetch_failure_aborts_run() {
    let h = Harness::new(MockPageFetcher::new().with_failure("timed out"));

    let err = h.watch().run_once(now()).await.unwrap_err();

    assert!(matches!(err, SaleWatchError::Network(_)));
    assert_eq!(h.push.push_count(), 0);
}

#[tokio::test]
async fn test_delivery_failure_still_marks_listings_seen() {
    let h = Harness::with_push(
        MockPageFetcher::new().with_page(listing_page(&[SaleRow::new("浦和店", TERM)])),
        MockPushService::new().failing_with(500),
    );

    let err = h.watch().run_once(now()).await.unwrap_err();
    assert!(matches!(err, SaleWatchError::Delivery { status: 500, .. }));

    let store = SeenStore::open(h.db_path()).await.unwrap();
    assert!(store.contains("浦和店_2024/01/01-01/07").await.unwrap());
    store.close().await;
}

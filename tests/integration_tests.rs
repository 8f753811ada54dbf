use catalog_scraper::{ReqwestTransport, RunSettings, ScrapeEngine, ScrapeError, COLUMNS};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn product(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("Product {}", id),
        "price": 10 * id,
        "category": {"id": 3, "name": "Phones", "slug": "phones"},
        "images": [format!("{}-a.jpg", id), format!("{}-b.jpg", id)]
    })
}

fn settings(server: &MockServer, temp_dir: &TempDir) -> RunSettings {
    RunSettings {
        base_url: server.url("/api/v1/az/products"),
        output_path: temp_dir.path().join("data").join("catalog.csv"),
        concurrency: 4,
        retry_delay: Duration::from_millis(5),
        request_timeout: Duration::from_secs(5),
        ..RunSettings::default()
    }
}

fn engine(settings: RunSettings) -> ScrapeEngine {
    let transport = ReqwestTransport::from_settings(&settings).unwrap();
    ScrapeEngine::new(Arc::new(transport), settings)
}

/// 輸出列的順序不固定，以商品 id 集合比較
fn read_output(path: &Path) -> (Vec<String>, Vec<csv::StringRecord>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let records = reader.records().map(|r| r.unwrap()).collect();
    (headers, records)
}

fn ids(records: &[csv::StringRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r[0].to_string()).collect()
}

#[tokio::test]
async fn test_three_pages_with_one_permanent_failure() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    let page1 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/az/products")
                .query_param("page", "1");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "products": [product(1), product(2)],
                    "pagination": {"current_page": 1, "last_page": 3}
                }));
        })
        .await;
    let page2 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/az/products")
                .query_param("page", "2");
            then.status(500);
        })
        .await;
    let page3 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/az/products")
                .query_param("page", "3");
            then.status(200).json_body(json!({"products": [product(3)]}));
        })
        .await;

    let settings = settings(&server, &temp_dir);
    let summary = engine(settings).run().await.unwrap();

    assert_eq!(summary.total_pages, 3);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.dropped_pages, vec![2]);
    assert!(!summary.is_complete());

    // 探索一次 + 抓取一次
    page1.assert_hits_async(2).await;
    page2.assert_hits_async(4).await;
    page3.assert_hits_async(1).await;

    let (headers, records) = read_output(&summary.output_path);
    assert_eq!(headers, COLUMNS.to_vec());
    assert_eq!(records.len(), 3);
    assert_eq!(
        ids(&records),
        ["1", "2", "3"].iter().map(|s| s.to_string()).collect()
    );

    let first = records.iter().find(|r| &r[0] == "1").unwrap();
    assert_eq!(&first[1], "Product 1");
    assert_eq!(&first[17], "Phones");
    assert_eq!(&first[26], "1-a.jpg | 1-b.jpg");
}

#[tokio::test]
async fn test_missing_pagination_aborts_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    let page1 = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/az/products");
            then.status(200).json_body(json!({"products": [product(1)]}));
        })
        .await;

    let settings = settings(&server, &temp_dir);
    let output_path = settings.output_path.clone();
    let err = engine(settings).run().await.unwrap_err();

    assert!(matches!(err, ScrapeError::Discovery { .. }));
    assert!(!output_path.exists());
    page1.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_many_pages_are_all_written() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let last_page = 25u64;

    let mut mocks = Vec::new();
    for page in 1..=last_page {
        let body = json!({
            "products": [product(page * 100), product(page * 100 + 1)],
            "pagination": {"last_page": last_page}
        });
        let page_param = page.to_string();
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/az/products")
                    .query_param("page", page_param.as_str());
                then.status(200)
                    .delay(Duration::from_millis(10))
                    .json_body(body);
            })
            .await;
        mocks.push(mock);
    }

    let settings = RunSettings {
        concurrency: 5,
        ..settings(&server, &temp_dir)
    };
    let summary = engine(settings).run().await.unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.rows_written, 2 * last_page);

    let (_, records) = read_output(&summary.output_path);
    let expected: BTreeSet<String> = (1..=last_page)
        .flat_map(|page| [page * 100, page * 100 + 1])
        .map(|id| id.to_string())
        .collect();
    assert_eq!(ids(&records), expected);

    mocks[0].assert_hits_async(2).await;
    for mock in &mocks[1..] {
        mock.assert_hits_async(1).await;
    }
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    let page1 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/az/products")
                .header("Referer", "https://satiram.az/")
                .header("DNT", "1")
                .header("Accept", "application/json, text/plain, */*");
            then.status(200).json_body(json!({
                "products": [product(7)],
                "pagination": {"last_page": 1}
            }));
        })
        .await;

    let summary = engine(settings(&server, &temp_dir)).run().await.unwrap();

    assert_eq!(summary.rows_written, 1);
    page1.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_timed_out_page_is_retried_then_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/az/products")
                .query_param("page", "1");
            then.status(200).json_body(json!({
                "products": [product(1)],
                "pagination": {"last_page": 2}
            }));
        })
        .await;
    let slow = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/az/products")
                .query_param("page", "2");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({"products": [product(2)]}));
        })
        .await;

    let settings = RunSettings {
        request_timeout: Duration::from_millis(200),
        retry_limit: 2,
        ..settings(&server, &temp_dir)
    };
    let summary = engine(settings).run().await.unwrap();

    assert_eq!(summary.dropped_pages, vec![2]);
    assert_eq!(summary.rows_written, 1);
    slow.assert_hits_async(2).await;
}

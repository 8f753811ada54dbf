use catalog_scraper::domain::ports::Transport;
use catalog_scraper::utils::error::TransportError;
use catalog_scraper::ReqwestTransport;
use httpmock::prelude::*;
use std::time::Duration;

/// 驗證 reqwest 傳輸層只回報狀態碼與內容，不解讀它們
#[tokio::test]
async fn test_status_and_body_are_passed_through() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/products")
                .query_param("page", "4")
                .header("X-Api-Key", "secret");
            then.status(404).body("not here");
        })
        .await;

    let transport = ReqwestTransport::new(2, false).unwrap();
    let headers = vec![("X-Api-Key".to_string(), "secret".to_string())];
    let response = transport
        .fetch(&server.url("/products?page=4"), &headers, Duration::from_secs(5))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
    assert_eq!(response.body, b"not here".to_vec());
}

#[tokio::test]
async fn test_slow_response_is_a_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(2)).body("{}");
        })
        .await;

    let transport = ReqwestTransport::new(1, false).unwrap();
    let err = transport
        .fetch(&server.url("/slow"), &[], Duration::from_millis(150))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransportError::Timeout {
            after: Duration::from_millis(150)
        }
    );
}

#[tokio::test]
async fn test_connection_refused_is_a_network_error() {
    // 綁定後立即釋放，取得一個沒有人監聽的埠
    let address = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let transport = ReqwestTransport::new(1, false).unwrap();
    let err = transport
        .fetch(
            &format!("http://{}/products", address),
            &[],
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Network(_)));
}

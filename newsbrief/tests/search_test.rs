use chrono::NaiveDate;
use newsbrief::search::{DateWindow, PerplexitySearch};

fn window() -> DateWindow {
    DateWindow::ending(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), 1)
}

#[tokio::test]
async fn test_search_maps_results_and_sends_filters() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/search")
        .match_header("authorization", "Bearer fake-api-key")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "query": "ai today",
            "max_results": 2,
            "search_after_date_filter": "10/18/2026",
            "search_before_date_filter": "10/19/2026"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "abc",
                "results": [
                    {"title": "First", "url": "https://news.example/1", "snippet": "one", "date": "2026-10-19"},
                    {"title": "Second", "url": "https://news.example/2", "snippet": "two"},
                    {"title": "Third", "url": "https://news.example/3", "snippet": "three"}
                ]
            }"#,
        )
        .create_async()
        .await;

    let search = PerplexitySearch::new(&server.url(), "fake-api-key").with_query_suffix("today");
    let articles = search.search_window("ai", 2, window()).await.expect("search");

    // provider returned more than asked; capped in provider order
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "First");
    assert_eq!(articles[0].date.as_deref(), Some("2026-10-19"));
    assert_eq!(articles[1].url, "https://news.example/2");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_auth_failure_is_fetch_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/search")
        .with_status(401)
        .with_body(r#"{"error": "invalid api key"}"#)
        .create_async()
        .await;

    let search = PerplexitySearch::new(&server.url(), "bad-key");
    let err = search.search_window("space", 5, window()).await.unwrap_err();

    assert_eq!(err.topic, "space");
    assert!(err.cause.contains("401"));
}

#[tokio::test]
async fn test_search_malformed_body_is_fetch_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let search = PerplexitySearch::new(&server.url(), "fake-api-key");
    let err = search.search_window("ai", 5, window()).await.unwrap_err();
    assert!(err.to_string().contains("ai"));
}

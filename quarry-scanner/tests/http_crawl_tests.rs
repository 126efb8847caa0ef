// Crawls against a mock HTTP server through the HTTP render session

use quarry_scanner::{CrawlConfig, Crawler, HttpSession, RecordKind};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

async fn mount_html(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

fn fast_config(depth: usize) -> CrawlConfig {
    CrawlConfig::default().without_delays().with_max_depth(depth)
}

#[tokio::test]
async fn test_crawl_captures_pages_and_resources() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<html><head><link rel="stylesheet" href="/site.css"></head><body>
            <a href="/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="https://elsewhere.invalid/">Elsewhere</a>
        </body></html>"#,
    )
    .await;
    mount_html(&server, "/page1", r#"<a href="/page3">deeper</a>"#).await;
    mount_html(&server, "/page2", "<html><body>P2</body></html>").await;
    mount_html(&server, "/page3", "<html><body>P3</body></html>").await;

    Mock::given(method("GET"))
        .and(path("/site.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/css")
                .set_body_string("body { color: red; }"),
        )
        .mount(&server)
        .await;

    let mut session = HttpSession::new().unwrap();
    let outcome = Crawler::new(fast_config(1))
        .crawl(&mut session, &server.uri())
        .await
        .unwrap();

    let pages: Vec<String> = outcome.records.pages().map(|r| r.url.clone()).collect();
    assert_eq!(
        pages,
        vec![
            format!("{}/", server.uri()),
            format!("{}/page1", server.uri()),
            format!("{}/page2", server.uri()),
        ]
    );

    let css = outcome
        .records
        .records()
        .iter()
        .find(|r| r.kind == RecordKind::Resource)
        .unwrap();
    assert_eq!(css.body, "body { color: red; }");
    assert_eq!(css.mime_type, "text/css");
}

#[tokio::test]
async fn test_missing_pages_are_skipped() {
    let server = MockServer::start().await;
    mount_html(&server, "/", r#"<a href="/gone">gone</a><a href="/here">here</a>"#).await;
    mount_html(&server, "/here", "<p>here</p>").await;

    let mut session = HttpSession::new().unwrap();
    let outcome = Crawler::new(fast_config(1).with_max_retries(2))
        .crawl(&mut session, &server.uri())
        .await
        .unwrap();

    assert_eq!(outcome.records.pages().count(), 2);
    assert_eq!(outcome.stats.pages_failed, 1);

    let requests = server.received_requests().await.unwrap();
    let gone_hits = requests.iter().filter(|r| r.url.path() == "/gone").count();
    assert_eq!(gone_hits, 2);
}

#[tokio::test]
async fn test_custom_headers_reach_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer t0ken"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(r#"<a href="/inner">inner</a>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer t0ken"))
        .and(path("/inner"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<p>inner</p>"),
        )
        .mount(&server)
        .await;

    let mut session = HttpSession::new().unwrap();
    let outcome = Crawler::new(fast_config(2).with_header("Authorization", "Bearer t0ken"))
        .crawl(&mut session, &server.uri())
        .await
        .unwrap();

    assert_eq!(outcome.records.pages().count(), 2);
}

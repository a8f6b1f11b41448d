//! Integration tests for sitemap traversal
//!
//! These tests use wiremock to serve sitemap trees over HTTP and exercise the
//! full fetch, stream, and fan-out cycle end-to-end.

use sitemap_stream::config::{parse_config, HttpConfig};
use sitemap_stream::policy::policy_fn;
use sitemap_stream::{
    extract_sitemap_directives, Flow, HttpTransport, Options, Page, PageCollector, SitemapError,
    SitemapWalker, SkipFailed, VisitedSet,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn urlset(entries: &[(&str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(loc, lastmod)| {
            format!(
                "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n  </url>\n",
                loc, lastmod
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>\n",
        body
    )
}

fn sitemap_index(children: &[&str]) -> String {
    let body: String = children
        .iter()
        .map(|loc| format!("  <sitemap>\n    <loc>{}</loc>\n  </sitemap>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>\n",
        body
    )
}

/// Mounts an XML document at `route`, expecting it to be fetched `times` times
async fn serve(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(body),
        )
        .expect(times)
        .mount(server)
        .await;
}

fn http_walker(options: Options) -> SitemapWalker {
    let transport = HttpTransport::from_config(&HttpConfig {
        timeout_secs: 5,
        connect_timeout_secs: 2,
        ..HttpConfig::default()
    })
    .expect("Failed to build transport");
    SitemapWalker::new(transport, options)
}

fn sorted_urls(pages: &[Page]) -> Vec<String> {
    let mut urls: Vec<String> = pages.iter().map(|p| p.url.clone()).collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_index_with_two_page_sets() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            &format!("{}/sitemap1.xml", base),
            &format!("{}/sitemap2.xml", base),
        ]),
        1,
    )
    .await;
    serve(
        &server,
        "/sitemap1.xml",
        urlset(&[
            (&format!("{}/one", base), "2024-01-01"),
            (&format!("{}/two", base), "2024-01-02"),
        ]),
        1,
    )
    .await;
    serve(
        &server,
        "/sitemap2.xml",
        urlset(&[
            (&format!("{}/three", base), "2024-01-03"),
            (&format!("{}/four", base), "2024-01-04"),
        ]),
        1,
    )
    .await;

    let pages = http_walker(Options::default())
        .collect(&format!("{}/sitemap.xml", base))
        .await
        .expect("Traversal failed");

    assert_eq!(pages.len(), 4);
    for page in &pages {
        let expected = if page.url.ends_with("/one") || page.url.ends_with("/two") {
            format!("{}/sitemap1.xml", base)
        } else {
            format!("{}/sitemap2.xml", base)
        };
        assert_eq!(page.source_sitemap_url, expected);
        assert_ne!(page.source_sitemap_url, format!("{}/sitemap.xml", base));
    }

    let one = pages.iter().find(|p| p.url.ends_with("/one")).unwrap();
    assert_eq!(one.last_modified, "2024-01-01");
}

#[tokio::test]
async fn test_relative_locations_resolved_against_fetched_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(&server, "/maps/index.xml", sitemap_index(&["pages.xml"]), 1).await;
    serve(
        &server,
        "/maps/pages.xml",
        urlset(&[("/about", "2024-02-01"), ("blog/post", "2024-02-02")]),
        1,
    )
    .await;

    let pages = http_walker(Options::default())
        .collect(&format!("{}/maps/index.xml", base))
        .await
        .expect("Traversal failed");

    assert_eq!(
        pages.iter().map(|p| p.url.clone()).collect::<Vec<_>>(),
        vec![format!("{}/about", base), format!("{}/maps/blog/post", base)]
    );
}

#[tokio::test]
async fn test_failing_child_is_aggregated() {
    let server = MockServer::start().await;
    let base = server.uri();
    let broken = format!("{}/broken.xml", base);

    serve(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            &format!("{}/a.xml", base),
            &broken,
            &format!("{}/c.xml", base),
        ]),
        1,
    )
    .await;
    serve(&server, "/a.xml", urlset(&[(&format!("{}/a", base), "")]), 1).await;
    serve(&server, "/c.xml", urlset(&[(&format!("{}/c", base), "")]), 1).await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let collector = PageCollector::new();
    let err = http_walker(Options::default())
        .traverse(&format!("{}/sitemap.xml", base), &|page| collector.push(page))
        .await
        .expect_err("Traversal should fail");

    assert!(matches!(err, SitemapError::Aggregate(_)));
    assert_eq!(err.failed_urls(), vec![broken.as_str()]);
    assert_eq!(
        sorted_urls(&collector.into_pages()),
        vec![format!("{}/a", base), format!("{}/c", base)]
    );
}

#[tokio::test]
async fn test_skip_failed_policy_completes() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/sitemap.xml",
        sitemap_index(&[&format!("{}/missing.xml", base), &format!("{}/ok.xml", base)]),
        1,
    )
    .await;
    serve(&server, "/ok.xml", urlset(&[(&format!("{}/ok", base), "")]), 1).await;

    let pages = http_walker(Options::new().with_error_policy(SkipFailed))
        .collect(&format!("{}/sitemap.xml", base))
        .await
        .expect("Failure should have been recovered");

    assert_eq!(sorted_urls(&pages), vec![format!("{}/ok", base)]);
}

#[tokio::test]
async fn test_error_policy_sees_status_failure() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let options = Options::new().with_error_policy(policy_fn(move |err, ctx| {
        let status = match &err {
            SitemapError::Status { status, .. } => Some(*status),
            _ => None,
        };
        recorder.lock().unwrap().push((ctx.url.clone(), status));
        Err(err)
    }));

    let url = format!("{}/sitemap.xml", base);
    let err = http_walker(options).collect(&url).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(*seen.lock().unwrap(), vec![(url, Some(503))]);
}

#[tokio::test]
async fn test_stop_after_first_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/sitemap.xml",
        urlset(&[
            (&format!("{}/1", base), ""),
            (&format!("{}/2", base), ""),
            (&format!("{}/3", base), ""),
        ]),
        1,
    )
    .await;

    let collector = PageCollector::new();
    let result = http_walker(Options::default())
        .traverse(&format!("{}/sitemap.xml", base), &|page| {
            collector.push(page);
            Flow::Stop
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(
        sorted_urls(&collector.into_pages()),
        vec![format!("{}/1", base)]
    );
}

#[tokio::test]
async fn test_shared_child_fetched_once_across_roots() {
    let server = MockServer::start().await;
    let base = server.uri();
    let shared = format!("{}/shared.xml", base);

    serve(&server, "/news.xml", sitemap_index(&[&shared]), 1).await;
    serve(&server, "/blog.xml", sitemap_index(&[&shared]), 1).await;
    serve(&server, "/shared.xml", urlset(&[(&format!("{}/p", base), "")]), 1).await;

    let visited = VisitedSet::new();
    let collector = PageCollector::new();
    http_walker(Options::new().with_max_parallel(2))
        .traverse_many(
            [format!("{}/news.xml", base), format!("{}/blog.xml", base)],
            &|page| collector.push(page),
            &visited,
        )
        .await
        .expect("Traversal failed");

    assert_eq!(collector.len(), 1);
    assert!(visited.contains(&shared));
    // MockServer verifies the expected fetch counts on drop
}

#[tokio::test]
async fn test_config_filters_sitemaps_and_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/sitemap.xml",
        sitemap_index(&[&format!("{}/archive.xml", base), &format!("{}/live.xml", base)]),
        1,
    )
    .await;
    serve(&server, "/archive.xml", urlset(&[]), 0).await;
    serve(
        &server,
        "/live.xml",
        urlset(&[
            (&format!("{}/post", base), ""),
            (&format!("{}/tag/rust", base), ""),
        ]),
        1,
    )
    .await;

    let config = parse_config(
        r#"
[traversal]
max-parallel = 1

[filter]
exclude-patterns = ["/tag/"]
sitemap-exclude-patterns = ["archive"]
"#,
    )
    .expect("Invalid config");

    let pages = http_walker(config.to_options().unwrap())
        .collect(&format!("{}/sitemap.xml", base))
        .await
        .expect("Traversal failed");

    assert_eq!(sorted_urls(&pages), vec![format!("{}/post", base)]);
}

#[tokio::test]
async fn test_user_agent_from_config() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::from_config(&HttpConfig {
        user_agent: "TestBot/1.0".to_string(),
        ..HttpConfig::default()
    })
    .unwrap();

    SitemapWalker::new(transport, Options::default())
        .collect(&format!("{}/sitemap.xml", server.uri()))
        .await
        .expect("Request should carry the configured user agent");
}

#[tokio::test]
async fn test_request_timeout_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(urlset(&[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::from_config(&HttpConfig {
        timeout_secs: 1,
        connect_timeout_secs: 1,
        ..HttpConfig::default()
    })
    .unwrap();

    let err = SitemapWalker::new(transport, Options::default())
        .collect(&format!("{}/slow.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test]
async fn test_robots_directives_feed_traversal() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(&server, "/sitemap1.xml", urlset(&[(&format!("{}/x", base), "")]), 1).await;
    serve(&server, "/sitemap2.xml", urlset(&[(&format!("{}/y", base), "")]), 1).await;

    let robots = format!(
        "User-agent: *\nDisallow: /private\nSitemap: {base}/sitemap1.xml\nsitemap: {base}/sitemap2.xml\n"
    );
    let directives = extract_sitemap_directives(&robots);
    assert_eq!(
        directives,
        vec![format!("{}/sitemap1.xml", base), format!("{}/sitemap2.xml", base)]
    );

    let pages = http_walker(Options::default())
        .collect_many(directives)
        .await
        .expect("Traversal failed");

    assert_eq!(sorted_urls(&pages), vec![format!("{}/x", base), format!("{}/y", base)]);
}

//! Integration tests for the fetch and extraction pipeline
//!
//! These tests use wiremock to stand in for a shop and its robots.txt, and
//! run the engine end to end into a temporary SQLite database.

use price_sentinel::config::parse_config;
use price_sentinel::storage::{open_store, PriceStore};
use price_sentinel::{Engine, SentinelError};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECIPE: &str = r#"
domain = "127.0.0.1"

[fields.price]
kind = "css"
expression = ".price"

[fields.product_title]
kind = "css"
expression = "h1"

[fields.sku]
kind = "regex"
expression = 'data-sku="([^"]+)"'

[options]
currency = "CLP"
"#;

/// Writes a recipe directory and builds a configuration pointing at `dir`
fn setup(dir: &TempDir, extra: &str) -> Engine {
    setup_with(dir, RECIPE, 2000, extra)
}

fn setup_with(dir: &TempDir, recipe: &str, timeout_ms: u64, extra: &str) -> Engine {
    let recipes = dir.path().join("recipes");
    std::fs::create_dir_all(&recipes).unwrap();
    std::fs::write(recipes.join("local.toml"), recipe).unwrap();

    let config = format!(
        r#"
[fetcher]
timeout-ms = {timeout_ms}
robots-timeout-ms = 300

[user-agent]
crawler-name = "PriceSentinel"
crawler-version = "0.1"
contact-url = "https://example.com/bot"
contact-email = "bot@example.com"

[rate-limit]
requests-per-minute = 6000
global-delay-ms = 0

[retry]
max-retries = 2
backoff-factor = 2.0
initial-delay-ms = 20
max-delay-ms = 100

[output]
database-path = "{db}"

[recipes]
directory = "{recipes}"

{extra}
"#,
        db = dir.path().join("prices.db").display(),
        recipes = recipes.display(),
        timeout_ms = timeout_ms,
        extra = extra,
    );

    Engine::from_config(&parse_config(&config).unwrap()).unwrap()
}

fn quiet() -> &'static str {
    "[notify]\nconsole = false\n"
}

fn product_page(title: &str, price: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            r#"<html><body>
            <h1>{}</h1>
            <div class="price" data-sku="SKU-77">{}</div>
            </body></html>"#,
            title, price
        ))
        .insert_header("content-type", "text/html")
}

async fn robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn test_end_to_end_record_is_stored() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/p/espresso"))
        .respond_with(product_page("Espresso Machine", "$ 1.234.567"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let target = url(&server, "/p/espresso");
    let recipe = engine.recipe_for(&target).unwrap();

    let record = engine.process(&recipe, &target).await.unwrap();

    assert_eq!(record.product_title, "Espresso Machine");
    assert_eq!(record.site, "127.0.0.1");
    assert_eq!(record.currency, "CLP");
    // several dots never reduce to one decimal point
    assert_eq!(record.price, None);

    drop(engine);
    let store = open_store(&dir.path().join("prices.db")).unwrap();
    let stored = store.latest("Espresso Machine", 10).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].url, target.as_str());
}

#[tokio::test]
async fn test_batch_tallies_and_persists() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nDisallow: /private/\n").await;
    Mock::given(method("GET"))
        .and(path("/p/kettle"))
        .respond_with(product_page("Kettle", "$ 12.345,67"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/mug"))
        .respond_with(product_page("Mug", "consultar"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/item"))
        .respond_with(product_page("Secret", "1"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let targets = vec![
        url(&server, "/p/kettle"),
        url(&server, "/private/item"),
        url(&server, "/p/mug"),
    ];

    let report = engine.process_batch(&targets).await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.missing_price, 1);
    assert_eq!(report.failed, 1);
    assert!(report.failures[0].0.ends_with("/private/item"));

    let stats = engine.store().lock().await.stats().unwrap();
    assert_eq!(stats.total_records, 2);
    assert_eq!(stats.products, 2);
    assert_eq!(stats.sites, 1);

    let kettle = engine.store().lock().await.latest("Kettle", 1).unwrap();
    assert_eq!(kettle[0].price, Some(d("12345.67")));
}

#[tokio::test]
async fn test_robots_disallow_is_not_fetched() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: PriceSentinel\nDisallow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(product_page("Kettle", "10"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let target = url(&server, "/p/1");
    let recipe = engine.recipe_for(&target).unwrap();

    let err = engine.process(&recipe, &target).await.unwrap_err();

    assert!(matches!(err, SentinelError::RobotsDisallowed { .. }));
}

#[tokio::test]
async fn test_missing_robots_allows_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(product_page("Kettle", "10"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let target = url(&server, "/p/1");
    let recipe = engine.recipe_for(&target).unwrap();

    let record = engine.process(&recipe, &target).await.unwrap();
    assert_eq!(record.price, Some(d("10")));
}

#[tokio::test]
async fn test_slow_robots_allows_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /\n")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(product_page("Kettle", "10"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let target = url(&server, "/p/1");
    let recipe = engine.recipe_for(&target).unwrap();

    assert!(engine.process(&recipe, &target).await.is_ok());
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/p/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let target = url(&server, "/p/gone");
    let recipe = engine.recipe_for(&target).unwrap();

    let err = engine.process(&recipe, &target).await.unwrap_err();

    assert!(matches!(err, SentinelError::ClientError { .. }));
    assert!(err.is_terminal());
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/p/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/flaky"))
        .respond_with(product_page("Kettle", "19,99"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let target = url(&server, "/p/flaky");
    let recipe = engine.recipe_for(&target).unwrap();

    let record = engine.process(&recipe, &target).await.unwrap();
    assert_eq!(record.price, Some(d("19.99")));
}

#[tokio::test]
async fn test_server_error_exhausts_retries() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/p/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let target = url(&server, "/p/down");
    let recipe = engine.recipe_for(&target).unwrap();

    match engine.process(&recipe, &target).await.unwrap_err() {
        SentinelError::RetryExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected exhausted retries, got {other:?}"),
    }
}

#[tokio::test]
async fn test_crawl_delay_spaces_requests() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nCrawl-delay: 1\n").await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(product_page("Kettle", "10"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup(&dir, quiet());
    let target = url(&server, "/p/1");
    let recipe = engine.recipe_for(&target).unwrap();

    let started = Instant::now();
    engine.process(&recipe, &target).await.unwrap();
    engine.process(&recipe, &target).await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_price_drop_posts_webhook() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/p/kettle"))
        .respond_with(product_page("Kettle", "100,00"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/kettle"))
        .respond_with(product_page("Kettle", "90,00"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let notify = format!(
        "[notify]\nconsole = false\nwebhook-url = \"{}/hook\"\n",
        server.uri()
    );
    let engine = setup(&dir, &notify);
    let target = url(&server, "/p/kettle");
    let recipe = engine.recipe_for(&target).unwrap();

    engine.process(&recipe, &target).await.unwrap();
    engine.process(&recipe, &target).await.unwrap();

    let history = engine.store().lock().await.latest("Kettle", 5).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].price, Some(d("90")));
}

fn dynamic_recipe() -> String {
    RECIPE.replace("[options]\n", "[options]\ndynamic = true\n")
}

#[tokio::test]
async fn test_dynamic_recipe_waits_for_price() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/p/lazy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><h1>Lazy</h1></body></html>"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/lazy"))
        .respond_with(product_page("Lazy", "15,90"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup_with(&dir, &dynamic_recipe(), 3000, quiet());
    let target = url(&server, "/p/lazy");
    let recipe = engine.recipe_for(&target).unwrap();

    let record = engine.process(&recipe, &target).await.unwrap();
    assert_eq!(record.price, Some(d("15.90")));
}

#[tokio::test]
async fn test_dynamic_selector_timeout_is_retried() {
    let server = MockServer::start().await;
    robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/p/never"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><h1>Never</h1></body></html>"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = setup_with(&dir, &dynamic_recipe(), 600, quiet());
    let target = url(&server, "/p/never");
    let recipe = engine.recipe_for(&target).unwrap();

    match engine.process(&recipe, &target).await.unwrap_err() {
        SentinelError::RetryExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected exhausted retries, got {other:?}"),
    }
}

#[test]
fn test_missing_recipe_dir_is_empty_book() {
    let dir = TempDir::new().unwrap();
    let book =
        price_sentinel::recipe::load_recipes_from_dir(&dir.path().join("absent")).unwrap();
    assert!(book.is_empty());
}

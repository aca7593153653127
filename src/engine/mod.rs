//! Pipeline orchestration
//!
//! The engine runs one URL through the whole pipeline:
//! 1. Fetch the page politely (`ContentFetcher`)
//! 2. Extract fields with the site's recipe (`PriceExtractor`)
//! 3. Compare the price with history and alert on drops (`PriceHistoryGate`)
//! 4. Append the observation to the price store
//!
//! Fetch failures end the run for that URL and are returned. Extraction misses,
//! store writes and notifications never fail the run; they are logged.

mod record;

pub use record::ExtractedRecord;

use crate::config::Config;
use crate::extract::PriceExtractor;
use crate::fetch::{ContentFetcher, FetchRequest, HttpRenderer, Renderer, UserAgentPool};
use crate::history::PriceHistoryGate;
use crate::notify::NotificationDispatcher;
use crate::output::BatchReport;
use crate::ratelimit::RateLimiter;
use crate::recipe::{load_recipes_from_dir, ExtractionRecipe, RecipeBook};
use crate::retry::RetryPolicy;
use crate::robots::DomainPolicy;
use crate::storage::{open_store, PriceStore};
use crate::url::extract_domain;
use crate::{Result, SentinelError};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

/// Price store shared between the engine and its callers
pub type SharedStore = Arc<Mutex<dyn PriceStore + Send>>;

/// Composes fetching, extraction, history and persistence
pub struct Engine {
    fetcher: ContentFetcher,
    extractor: PriceExtractor,
    gate: PriceHistoryGate,
    store: SharedStore,
    recipes: RecipeBook,
    timeout: Duration,
}

impl Engine {
    /// Creates an engine from already-built components
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Polite fetcher
    /// * `gate` - Price drop detection and notification
    /// * `store` - Where observations are appended
    /// * `recipes` - Recipes used by [`process_batch`](Self::process_batch)
    /// * `timeout` - Render timeout for each fetch
    pub fn new(
        fetcher: ContentFetcher,
        gate: PriceHistoryGate,
        store: SharedStore,
        recipes: RecipeBook,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractor: PriceExtractor::new(),
            gate,
            store,
            recipes,
            timeout,
        }
    }

    /// Builds every component from configuration
    ///
    /// One reqwest client is shared by the renderer and the webhook notifier.
    /// The database and the recipe directory are opened here.
    ///
    /// # Returns
    ///
    /// * `Ok(Engine)` - Ready to process URLs
    /// * `Err(SentinelError)` - Client, database or recipe directory failure
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        let renderer: Arc<dyn Renderer> = Arc::new(HttpRenderer::with_client(client.clone()));
        let policy = if config.fetcher.respect_robots {
            DomainPolicy::new(Arc::clone(&renderer), config.fetcher.robots_timeout())
                .with_max_crawl_delay(config.fetcher.max_crawl_delay())
        } else {
            warn!("robots.txt checks are disabled by configuration");
            DomainPolicy::disabled(Arc::clone(&renderer))
        };

        let fetcher = ContentFetcher::new(
            renderer,
            Arc::new(policy),
            Arc::new(RateLimiter::from_config(&config.rate_limit)),
            RetryPolicy::from_config(&config.retry),
            Arc::new(UserAgentPool::from_config(&config.user_agent)),
        );

        let store = open_store(Path::new(&config.output.database_path))?;
        let store: SharedStore = Arc::new(Mutex::new(store));

        let gate = PriceHistoryGate::new(NotificationDispatcher::from_config(
            &config.notify,
            client,
        ));
        let recipes = load_recipes_from_dir(Path::new(&config.recipes.directory))?;

        Ok(Self::new(
            fetcher,
            gate,
            store,
            recipes,
            config.fetcher.timeout(),
        ))
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    /// Finds the recipe for `url`'s host, exact matches first
    pub fn recipe_for(&self, url: &Url) -> Option<Arc<ExtractionRecipe>> {
        extract_domain(url).and_then(|host| self.recipes.find(&host))
    }

    /// Runs one URL through the pipeline with `recipe`
    ///
    /// # Returns
    ///
    /// * `Ok(ExtractedRecord)` - The observation, with `price: None` if no price was found
    /// * `Err(SentinelError)` - The page could not be fetched
    pub async fn process(&self, recipe: &ExtractionRecipe, url: &Url) -> Result<ExtractedRecord> {
        self.process_with_cancel(recipe, url, &CancellationToken::new())
            .await
    }

    /// Like [`process`](Self::process), aborting the fetch when `cancel` fires
    pub async fn process_with_cancel(
        &self,
        recipe: &ExtractionRecipe,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<ExtractedRecord> {
        let request = FetchRequest::for_recipe(url.clone(), recipe, self.timeout);
        let html = self.fetcher.fetch_with_cancel(&request, cancel).await?;

        let fields = self.extractor.extract(&html, recipe);
        let record = ExtractedRecord {
            site: extract_domain(url).unwrap_or_default(),
            product_title: fields.title.unwrap_or_else(|| url.to_string()),
            price: fields.price,
            currency: fields
                .currency
                .unwrap_or_else(|| recipe.default_currency().to_string()),
            url: url.to_string(),
            captured_at: Utc::now(),
        };

        // History is read before this observation is appended
        if let Some(price) = record.price {
            self.gate
                .check_and_notify(&*self.store, record.product_key(), price, &record.url)
                .await;
        }

        let appended = self.store.lock().await.append(&record);
        if let Err(e) = appended {
            error!(url = %record.url, error = %e, "Failed to store price record");
        }

        match record.price {
            Some(price) => info!(
                product = %record.product_title,
                price = %price,
                currency = %record.currency,
                "Recorded price"
            ),
            None => warn!(url = %record.url, "No price found on page"),
        }

        Ok(record)
    }

    /// Processes every URL in order, continuing past failures
    pub async fn process_batch(&self, targets: &[Url]) -> BatchReport {
        self.process_batch_with_cancel(targets, &CancellationToken::new())
            .await
    }

    /// Like [`process_batch`](Self::process_batch); stops starting new URLs once `cancel` fires
    pub async fn process_batch_with_cancel(
        &self,
        targets: &[Url],
        cancel: &CancellationToken,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for url in targets {
            if cancel.is_cancelled() {
                warn!(remaining = targets.len() - report.total(), "Batch cancelled");
                break;
            }

            let outcome = match self.recipe_for(url) {
                Some(recipe) => self.process_with_cancel(&recipe, url, cancel).await,
                None => Err(SentinelError::NoRecipe {
                    url: url.to_string(),
                }),
            };

            match outcome {
                Ok(record) => report.record_success(&record),
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to process URL");
                    report.record_failure(url.as_str(), &e);
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            missing_price = report.missing_price,
            "Batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedRenderer;
    use crate::notify::{Notifier, PriceDropEvent};
    use crate::recipe::parse_recipe;
    use crate::storage::SqliteStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Mutex as StdMutex;

    const RECIPE: &str = r#"
domain = "shop.example.com"

[fields.price]
kind = "css"
expression = ".price"

[fields.product_title]
kind = "css"
expression = "h1"

[options]
currency = "EUR"
"#;

    #[derive(Default)]
    struct Recording {
        events: StdMutex<Vec<PriceDropEvent>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, event: &PriceDropEvent) -> bool {
            self.events.lock().unwrap().push(event.clone());
            true
        }
    }

    fn page(title: &str, price: &str) -> String {
        format!(
            "<html><body><h1>{}</h1><div class=\"price\">{}</div></body></html>",
            title, price
        )
    }

    fn engine(renderer: ScriptedRenderer, recorder: Arc<Recording>) -> Engine {
        let renderer: Arc<dyn Renderer> = Arc::new(renderer);
        let fetcher = ContentFetcher::new(
            Arc::clone(&renderer),
            Arc::new(DomainPolicy::new(
                Arc::clone(&renderer),
                Duration::from_secs(5),
            )),
            Arc::new(RateLimiter::new(600, Duration::ZERO)),
            RetryPolicy::default(),
            Arc::new(UserAgentPool::single("TestBot/1.0")),
        );

        let mut dispatcher = NotificationDispatcher::new();
        dispatcher.add(recorder);

        let mut recipes = RecipeBook::new();
        recipes.insert(parse_recipe(RECIPE).unwrap());

        let store: SharedStore = Arc::new(Mutex::new(SqliteStore::new_in_memory().unwrap()));
        Engine::new(
            fetcher,
            PriceHistoryGate::new(dispatcher),
            store,
            recipes,
            Duration::from_secs(5),
        )
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_builds_record() {
        let url = Url::parse("https://shop.example.com/p/1").unwrap();
        let renderer = ScriptedRenderer::new().page(url.as_str(), &page("Kettle", "€ 1.234,50"));
        let engine = engine(renderer, Arc::default());
        let recipe = engine.recipe_for(&url).unwrap();

        let record = engine.process(&recipe, &url).await.unwrap();

        assert_eq!(record.site, "shop.example.com");
        assert_eq!(record.product_title, "Kettle");
        assert_eq!(record.price, Some(d("1234.50")));
        assert_eq!(record.currency, "EUR");

        let stored = engine.store().lock().await.latest("Kettle", 5).unwrap();
        assert_eq!(stored, vec![record]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_title_falls_back_to_url() {
        let url = Url::parse("https://shop.example.com/p/2").unwrap();
        let renderer = ScriptedRenderer::new().page(
            url.as_str(),
            "<html><body><div class=\"price\">10</div></body></html>",
        );
        let engine = engine(renderer, Arc::default());
        let recipe = engine.recipe_for(&url).unwrap();

        let record = engine.process(&recipe, &url).await.unwrap();

        assert_eq!(record.product_title, url.as_str());
        assert_eq!(record.price, Some(d("10")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_price_is_stored_not_failed() {
        let url = Url::parse("https://shop.example.com/p/3").unwrap();
        let renderer = ScriptedRenderer::new().page(url.as_str(), &page("Kettle", "sin precio"));
        let engine = engine(renderer, Arc::default());
        let recipe = engine.recipe_for(&url).unwrap();

        let record = engine.process(&recipe, &url).await.unwrap();

        assert_eq!(record.price, None);
        assert_eq!(engine.store().lock().await.stats().unwrap().total_records, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_drop_notifies() {
        let url = Url::parse("https://shop.example.com/p/4").unwrap();
        let renderer = ScriptedRenderer::new().script(
            url.as_str(),
            vec![
                Ok(page("Kettle", "100,00")),
                Ok(page("Kettle", "98,00")),
            ],
        );
        let recorder = Arc::new(Recording::default());
        let engine = engine(renderer, Arc::clone(&recorder));
        let recipe = engine.recipe_for(&url).unwrap();

        engine.process(&recipe, &url).await.unwrap();
        assert!(recorder.events.lock().unwrap().is_empty());

        engine.process(&recipe, &url).await.unwrap();
        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].previous_price, d("100"));
        assert_eq!(events[0].current_price, d("98"));
        assert_eq!(events[0].drop_pct, d("2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_continues_past_failures() {
        let ok = Url::parse("https://shop.example.com/p/ok").unwrap();
        let gone = Url::parse("https://shop.example.com/p/gone").unwrap();
        let bare = Url::parse("https://shop.example.com/p/bare").unwrap();
        let unknown = Url::parse("https://other.example.org/p/1").unwrap();

        let renderer = ScriptedRenderer::new()
            .page(ok.as_str(), &page("Kettle", "19,99"))
            .script(gone.as_str(), vec![Err(404)])
            .page(bare.as_str(), &page("Mug", "ask us"));
        let engine = engine(renderer, Arc::default());

        let report = engine
            .process_batch(&[ok, gone.clone(), bare, unknown.clone()])
            .await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.missing_price, 1);
        assert_eq!(report.failed, 2);
        let failed: Vec<&str> = report.failures.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(failed, vec![gone.as_str(), unknown.as_str()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_stops_when_cancelled() {
        let url = Url::parse("https://shop.example.com/p/1").unwrap();
        let renderer = ScriptedRenderer::new().page(url.as_str(), &page("Kettle", "1"));
        let engine = engine(renderer, Arc::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = engine.process_batch_with_cancel(&[url], &cancel).await;

        assert_eq!(report.total(), 0);
    }
}

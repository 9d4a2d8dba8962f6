//! Shared browser session backed by Chromium.
//!
//! A search run launches one [`BrowserPool`] and hands it to every source.
//! Sources open their own tabs through [`BrowserSession::create_page`]; the
//! orchestrator closes the pool once all sources have finished.

use crate::actions::{extract_domain, BrowserActions};
use crate::error::{BrowserError, Result};
use crate::fingerprint::{FingerprintConfig, STEALTH_ARGS, STEALTH_INIT_SCRIPT};
use crate::session::{BrowserSession, SessionLauncher};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use landscout_core::ScrapingConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Interval between selector probes in `wait_for_selector`.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the shared browser is launched.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Apply automation-hiding launch flags and page overrides
    pub stealth: bool,
    /// User agent, viewport, locale and timezone presented to sites
    pub fingerprint: FingerprintConfig,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            headless: true,
            stealth: true,
            fingerprint: FingerprintConfig::default(),
        }
    }
}

impl PoolOptions {
    /// Options from the scraping section of the app config.
    ///
    /// An empty `user_agent` picks one of the built-in desktop agents.
    pub fn from_config(config: &ScrapingConfig) -> Self {
        let fingerprint = if config.user_agent.trim().is_empty() {
            FingerprintConfig::randomized()
        } else {
            FingerprintConfig::with_user_agent(config.user_agent.clone())
        };

        Self {
            headless: config.headless,
            stealth: config.stealth,
            fingerprint,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(
                self.fingerprint.viewport_width,
                self.fingerprint.viewport_height,
            )
            .arg(self.fingerprint.lang_arg());

        if !self.headless {
            builder = builder.with_head();
        }
        if self.stealth {
            builder = builder.args(STEALTH_ARGS);
        }

        builder.build().map_err(BrowserError::LaunchFailed)
    }
}

/// One Chromium process shared by every source in a search run.
///
/// Pages are independent tabs in the browser's default context, so they share
/// cookies and the stealth fingerprint.
pub struct BrowserPool {
    browser: Mutex<Browser>,
    handler: Mutex<Option<JoinHandle<()>>>,
    options: PoolOptions,
    closed: AtomicBool,
}

impl BrowserPool {
    /// Launch the shared browser.
    pub async fn launch(options: PoolOptions) -> Result<Self> {
        let config = options.browser_config()?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Spawn browser handler
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler event error: {}", e);
                }
            }
        });

        tracing::info!(
            headless = options.headless,
            stealth = options.stealth,
            "launched shared browser"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            handler: Mutex::new(Some(handler_task)),
            options,
            closed: AtomicBool::new(false),
        })
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn prepare_page(&self, page: &Page) -> Result<()> {
        if !self.options.stealth {
            return Ok(());
        }

        let fingerprint = &self.options.fingerprint;
        page.enable_stealth_mode_with_agent(&fingerprint.user_agent)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
            STEALTH_INIT_SCRIPT,
        ))
        .await
        .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        page.execute(SetTimezoneOverrideParams::new(fingerprint.timezone.clone()))
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl BrowserSession for BrowserPool {
    async fn create_page(&self) -> Result<Box<dyn BrowserActions>> {
        if self.is_closed() {
            return Err(BrowserError::SessionClosed);
        }

        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        self.prepare_page(&page).await?;

        tracing::debug!("opened page in shared browser");
        Ok(Box::new(PooledPage { page }))
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut browser = self.browser.lock().await;

        // Pages first, then the process.
        if let Ok(pages) = browser.pages().await {
            for page in pages {
                if let Err(e) = page.close().await {
                    tracing::warn!("failed to close page during shutdown: {}", e);
                }
            }
        }

        let result = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::ChromiumError(e.to_string()));
        if let Err(e) = browser.wait().await {
            tracing::warn!("browser process did not exit cleanly: {}", e);
        }

        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }

        tracing::info!("closed shared browser");
        result
    }
}

/// A tab in the shared browser.
pub struct PooledPage {
    page: Page,
}

#[async_trait::async_trait]
impl BrowserActions for PooledPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let domain = extract_domain(url)?;
        tracing::debug!(domain = %domain, "navigating");

        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        Ok(())
    }

    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        element
            .type_str(value)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let probe = async {
            while self.page.find_element(selector).await.is_err() {
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), probe)
            .await
            .map_err(|_| BrowserError::Timeout(format!("waiting for selector {selector}")))
    }

    async fn extract_text(&self, selector: &str) -> Result<String> {
        let text = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?
            .inner_text()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn extract_all_text(&self, selector: &str) -> Result<Vec<String>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(text) = element
                .inner_text()
                .await
                .map_err(|e| BrowserError::ChromiumError(e.to_string()))?
            {
                texts.push(text.trim().to_string());
            }
        }
        Ok(texts)
    }

    async fn extract_attribute(&self, selector: &str, attribute: &str) -> Result<Option<String>> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?
            .attribute(attribute)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }
}

/// Launches a [`BrowserPool`] per search run.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    options: PoolOptions,
}

impl ChromiumLauncher {
    pub fn new(options: PoolOptions) -> Self {
        Self { options }
    }
}

#[async_trait::async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>> {
        let pool = BrowserPool::launch(self.options.clone()).await?;
        Ok(Arc::new(pool))
    }
}

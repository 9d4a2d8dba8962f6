use crate::error::{BrowserError, Result};

/// Page-level actions a source performs while scraping.
///
/// Every page handed out by a [`crate::BrowserSession`] implements this.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Fill a form field by selector
    async fn fill_field(&self, selector: &str, value: &str) -> Result<()>;

    /// Click an element by selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait for a selector to appear
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Extract text from the first element matching the selector
    async fn extract_text(&self, selector: &str) -> Result<String>;

    /// Extract text from every element matching the selector
    async fn extract_all_text(&self, selector: &str) -> Result<Vec<String>>;

    /// Read an attribute of the first element matching the selector
    async fn extract_attribute(&self, selector: &str, attribute: &str) -> Result<Option<String>>;

    /// Full HTML of the current document
    async fn content(&self) -> Result<String>;

    /// Close the page. The shared browser stays open.
    async fn close(&self) -> Result<()>;
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {e}")))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(ToString::to_string)
}

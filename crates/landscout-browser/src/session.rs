//! The seam between the search orchestrator and the browser.
//!
//! A [`SessionLauncher`] opens one [`BrowserSession`] per search run. The
//! session is shared by every source in the run; each source asks it for
//! its own page.

use crate::actions::BrowserActions;
use crate::error::Result;
use std::sync::Arc;

/// One browser process and context shared by concurrently running sources.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a fresh page bound to the shared context.
    async fn create_page(&self) -> Result<Box<dyn BrowserActions>>;

    /// Tear down the context and then the process.
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    async fn close(&self) -> Result<()>;
}

/// Opens shared browser sessions.
#[async_trait::async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Launch a new shared session.
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>>;
}

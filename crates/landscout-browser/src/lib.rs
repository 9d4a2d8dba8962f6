//! Browser automation for listing sites.
//!
//! One headless browser process is shared by every source running in a
//! search; each source gets its own page. Sources pace their page actions
//! with a [`RateLimiter`].

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod rate_limit;
pub mod session;

pub use actions::BrowserActions;
pub use engine::{BrowserPool, ChromiumLauncher, PoolOptions};
pub use error::{BrowserError, Result};
pub use fingerprint::FingerprintConfig;
pub use rate_limit::{randomized_delay, RateLimiter, RateLimiterOptions};
pub use session::{BrowserSession, SessionLauncher};

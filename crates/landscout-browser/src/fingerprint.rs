use rand::seq::SliceRandom;

/// Launch flags that hide the usual automation markers.
pub const STEALTH_ARGS: [&str; 4] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-features=IsolateOrigins,site-per-process",
    "--disable-dev-shm-usage",
    "--no-sandbox",
];

/// Script run on every new document when stealth is enabled.
pub const STEALTH_INIT_SCRIPT: &str = r"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
";

// Common desktop user agents
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
];

/// Fingerprint presented by the shared browser context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    pub timezone: String,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENTS[1].to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            locale: "en-US".to_string(),
            timezone: "America/Los_Angeles".to_string(),
        }
    }
}

impl FingerprintConfig {
    /// Default fingerprint with an explicit user agent.
    #[must_use]
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    /// Default fingerprint with a user agent picked from a small desktop set.
    #[must_use]
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();
        let user_agent = USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0]);
        Self::with_user_agent(*user_agent)
    }

    /// `--lang` flag matching the locale.
    #[must_use]
    pub fn lang_arg(&self) -> String {
        format!("--lang={}", self.locale)
    }
}

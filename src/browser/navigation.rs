use crate::core::BrowserTrait;
use crate::errors::{PageError, Result};
use regex::Regex;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use super::session::BrowserSession;

/// What a URL must look like after a state-changing action.
///
/// `Exact` compares the whole URL, `Glob` accepts `*` (anything but `/`),
/// `**` (anything) and `?` (one character), `Regex` is used as-is.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    Exact(String),
    Glob { source: String, regex: Regex },
    Regex(Regex),
}

impl UrlPattern {
    pub fn exact(url: impl Into<String>) -> Self {
        UrlPattern::Exact(url.into())
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        let mut translated = String::from("^");
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    translated.push_str(".*");
                }
                '*' => translated.push_str("[^/]*"),
                '?' => translated.push('.'),
                other => translated.push_str(&regex::escape(&other.to_string())),
            }
        }
        translated.push('$');

        let regex = Regex::new(&translated).map_err(|e| PageError::InvalidUrlPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(UrlPattern::Glob {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(UrlPattern::Regex)
            .map_err(|e| PageError::InvalidUrlPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Strings with glob metacharacters become globs, anything else is exact.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.contains('*') || pattern.contains('?') {
            Self::glob(pattern)
        } else {
            Ok(Self::exact(pattern))
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Exact(expected) => {
                url == expected || url.trim_end_matches('/') == expected.trim_end_matches('/')
            }
            UrlPattern::Glob { regex, .. } => regex.is_match(url),
            UrlPattern::Regex(regex) => regex.is_match(url),
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Exact(url) => write!(f, "{}", url),
            UrlPattern::Glob { source, .. } => write!(f, "{}", source),
            UrlPattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub reached: bool,
    pub url: String,
    pub duration_ms: u64,
}

pub struct NavigationManager;

impl NavigationManager {
    /// Waits for the URL to match after a click or submit.
    ///
    /// Running out of time is reported as `reached: false`; any other
    /// failure from the browser is returned as an error.
    pub async fn confirm<B: BrowserTrait>(
        session: &BrowserSession<B>,
        pattern: &UrlPattern,
        timeout: Duration,
    ) -> Result<NavigationResult> {
        let start_time = Instant::now();

        match session.wait_for_url(pattern, timeout).await {
            Ok(url) => Ok(NavigationResult {
                reached: true,
                url,
                duration_ms: start_time.elapsed().as_millis() as u64,
            }),
            Err(err) if err.is_timeout() => {
                let url = session.current_url().await?;
                warn!("Navigation to {} not confirmed, still at {}", pattern, url);
                Ok(NavigationResult {
                    reached: false,
                    url,
                    duration_ms: start_time.elapsed().as_millis() as u64,
                })
            }
            Err(err) => Err(err),
        }
    }
}

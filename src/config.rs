//! Document options
//!
//! Defaults can be overridden from the environment:
//!
//! | variable                        | field                  |
//! |---------------------------------|------------------------|
//! | `SPLICEXML_PRETTY_PRINT`        | `pretty_print`         |
//! | `SPLICEXML_KEEP_BLANKS`         | `keep_blanks`          |
//! | `SPLICEXML_FETCH_TIMEOUT_SECS`  | `fetch_timeout`        |
//! | `SPLICEXML_USER_AGENT`          | `user_agent`           |
//! | `SPLICEXML_MAX_INLINED_FILES`   | `max_inlined_files`    |
//! | `SPLICEXML_XPATH_CACHE_SIZE`    | `xpath_cache_capacity` |

use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::dom::ParseOptions;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_INLINED_FILES: usize = 10_000;
const DEFAULT_XPATH_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Per-document behavior switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Indent saved documents
    pub pretty_print: bool,
    /// Keep whitespace-only text nodes when parsing
    pub keep_blanks: bool,
    /// Timeout for fetching remote external data
    pub fetch_timeout: Duration,
    /// User agent sent with remote fetches
    pub user_agent: String,
    /// Upper bound on external files inlined into one document
    pub max_inlined_files: usize,
    /// Entries in each XPath cache
    pub xpath_cache_capacity: NonZeroUsize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            pretty_print: true,
            keep_blanks: false,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: concat!("splicexml/", env!("CARGO_PKG_VERSION")).to_string(),
            max_inlined_files: DEFAULT_MAX_INLINED_FILES,
            xpath_cache_capacity: DEFAULT_XPATH_CACHE_SIZE,
        }
    }
}

impl Options {
    /// Defaults overridden by `SPLICEXML_*` environment variables
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let defaults = Options::default();
        Options {
            pretty_print: env_value("SPLICEXML_PRETTY_PRINT").unwrap_or(defaults.pretty_print),
            keep_blanks: env_value("SPLICEXML_KEEP_BLANKS").unwrap_or(defaults.keep_blanks),
            fetch_timeout: env_value("SPLICEXML_FETCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            user_agent: env::var("SPLICEXML_USER_AGENT").unwrap_or(defaults.user_agent),
            max_inlined_files: env_value("SPLICEXML_MAX_INLINED_FILES")
                .unwrap_or(defaults.max_inlined_files),
            xpath_cache_capacity: env_value("SPLICEXML_XPATH_CACHE_SIZE")
                .unwrap_or(defaults.xpath_cache_capacity),
        }
    }

    /// Parser settings derived from these options
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            keep_blanks: self.keep_blanks,
        }
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.pretty_print);
        assert!(!options.keep_blanks);
        assert_eq!(options.xpath_cache_capacity.get(), 64);
        assert!(options.user_agent.starts_with("splicexml/"));
    }

    #[test]
    fn test_env_value_parsing() {
        // Unique keys so parallel tests do not interfere
        env::set_var("SPLICEXML_TEST_BOOL", "false");
        env::set_var("SPLICEXML_TEST_BAD", "many");
        assert_eq!(env_value::<bool>("SPLICEXML_TEST_BOOL"), Some(false));
        assert_eq!(env_value::<usize>("SPLICEXML_TEST_BAD"), None);
        assert_eq!(env_value::<usize>("SPLICEXML_TEST_UNSET"), None);
    }
}

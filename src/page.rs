//! Page-load parameter resolution: the query string of the current URL to a [`Selection`].

use crate::models::{Period, Selection, Site};
use log::debug;
use percent_encoding::percent_decode_str;

/// Query parameter carrying the site key.
pub const SITE_PARAM: &str = "site";
/// Query parameter carrying the period key.
pub const PERIOD_PARAM: &str = "time";

/// Whether the current execution may read client-only signals such as the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    /// Interactive session in a browser tab.
    Client,
    /// Non-interactive pre-render pass; output must not depend on the query string.
    Prerender,
}

/// Resolve the view selection for a page load.
///
/// Starts from `(all, all)`. In a [`RenderContext::Client`] context the `site`
/// and `time` parameters override the defaults when they name a known key;
/// anything else is ignored. Never fails.
pub fn load(url: &str, context: RenderContext) -> Selection {
    let mut selection = Selection::default();

    if context == RenderContext::Client {
        if let Some(value) = query_param(url, SITE_PARAM) {
            match Site::from_key(&value) {
                Some(site) => selection.site = site,
                None => debug!("ignoring unknown {SITE_PARAM}={value:?}"),
            }
        }
        if let Some(value) = query_param(url, PERIOD_PARAM) {
            match Period::from_key(&value) {
                Some(period) => selection.period = period,
                None => debug!("ignoring unknown {PERIOD_PARAM}={value:?}"),
            }
        }
    }

    selection
}

/// First value of query parameter `name` in `url`, decoded.
///
/// Accepts a full URL, a path with a query, or a bare `?a=b` string. The
/// fragment is ignored, `+` decodes to a space and percent escapes are decoded
/// (invalid UTF-8 is replaced). A key without `=` yields an empty value.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or("");
    let (_, query) = without_fragment.split_once('?')?;
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| decode_component(key) == name)
        .map(|(_, value)| decode_component(value))
}

fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_wins() {
        assert_eq!(
            query_param("/?site=meta&site=mefi", "site").as_deref(),
            Some("meta")
        );
    }

    #[test]
    fn decodes_and_ignores_fragment() {
        assert_eq!(
            query_param("https://x.test/p?q=a+b%21#time=all", "q").as_deref(),
            Some("a b!")
        );
        assert_eq!(query_param("https://x.test/p?q=1#time=all", "time"), None);
        assert_eq!(query_param("https://x.test/p", "q"), None);
        assert_eq!(query_param("?flag", "flag").as_deref(), Some(""));
    }

    #[test]
    fn encoded_valid_key_is_accepted() {
        let sel = load("/?site=%61skme", RenderContext::Client);
        assert_eq!(sel.site, Site::Askme);
    }
}

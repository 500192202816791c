//! A quick responsiveness report for a generated stylesheet.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static MEDIA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@media").unwrap());
static FLEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"display\s*:\s*flex").unwrap());
static GRID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"display\s*:\s*grid").unwrap());
static TOUCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"touch-action|tap-highlight-color|user-select").unwrap());
static VIEWPORT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+\s*(vw|vh|vmin|vmax)").unwrap());

/// Overall rating of a stylesheet's responsiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsiveStatus {
    Excellent,
    Good,
    Basic,
}

/// Counts of layout and responsiveness features found in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CssReport {
    pub media_queries: usize,
    pub flexbox_usage: usize,
    pub grid_usage: usize,
    pub has_touch_support: bool,
    pub has_viewport_units: bool,
    pub status: ResponsiveStatus,
    pub message: String,
}

impl CssReport {
    /// Scans `css` and rates it.
    ///
    /// # Examples
    ///
    /// ```
    /// use autocss::css_report::{CssReport, ResponsiveStatus};
    ///
    /// let report = CssReport::from_css("body { color: red; }");
    /// assert_eq!(report.status, ResponsiveStatus::Basic);
    /// ```
    pub fn from_css(css: &str) -> Self {
        let media_queries = MEDIA_RE.find_iter(css).count();
        let flexbox_usage = FLEX_RE.find_iter(css).count();
        let grid_usage = GRID_RE.find_iter(css).count();
        let has_touch_support = TOUCH_RE.is_match(css);
        let has_viewport_units = VIEWPORT_RE.is_match(css);

        let status = if media_queries > 3
            && (flexbox_usage > 2 || grid_usage > 1)
            && has_touch_support
            && has_viewport_units
        {
            ResponsiveStatus::Excellent
        } else if media_queries == 0 && flexbox_usage == 0 && grid_usage == 0 {
            ResponsiveStatus::Basic
        } else {
            ResponsiveStatus::Good
        };

        let message = match status {
            ResponsiveStatus::Excellent => {
                "Fully responsive: multiple breakpoints, modern layout, touch support and fluid units."
            }
            ResponsiveStatus::Good => {
                "Responsive: uses breakpoints or modern layout, with room for improvement."
            }
            ResponsiveStatus::Basic => {
                "Basic styling: no media queries or flexible layouts were found."
            }
        }
        .to_string();

        Self {
            media_queries,
            flexbox_usage,
            grid_usage,
            has_touch_support,
            has_viewport_units,
            status,
            message,
        }
    }
}

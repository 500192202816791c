//! Handles parsing of GitHub repository and folder URLs.

use once_cell::sync::Lazy;
use regex::Regex;

/// The parts of a GitHub URL needed to fetch a folder through the contents API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubLocation {
    pub owner: String,
    pub repo: String,
    /// Branch or tag. `None` means the repository's default branch.
    pub branch: Option<String>,
    /// Folder inside the repository, without leading or trailing slashes. Empty for the root.
    pub subdirectory: String,
}

/// Regex for GitHub folder URLs: `.../tree/branch/path`
static GITHUB_TREE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/tree/([^/]+)(?:/(.*))?$").unwrap()
});

/// Path segments that name GitHub pages rather than repository folders.
const RESERVED_SEGMENTS: &[&str] = &[
    "releases", "tags", "pull", "issues", "actions", "projects", "wiki", "security", "pulse",
    "graphs", "settings", "blob", "tree", "commit", "blame", "find",
];

/// Parses a GitHub URL pointing at a repository or a folder in it.
///
/// Accepts the official `.../tree/<branch>/<path>` form, "sloppy" URLs
/// that omit `/tree/<branch>` (the whole remainder is then the folder and the
/// default branch is used) and bare repository URLs. Query strings and
/// fragments are ignored.
///
/// # Examples
/// ```
/// use autocss::github::{parse_github_url, GithubLocation};
///
/// let parsed = parse_github_url("https://github.com/acme/site/tree/main/public").unwrap();
/// assert_eq!(parsed, GithubLocation {
///     owner: "acme".to_string(),
///     repo: "site".to_string(),
///     branch: Some("main".to_string()),
///     subdirectory: "public".to_string(),
/// });
///
/// let sloppy = parse_github_url("https://github.com/acme/site/docs/html").unwrap();
/// assert_eq!(sloppy.branch, None);
/// assert_eq!(sloppy.subdirectory, "docs/html");
///
/// let root = parse_github_url("https://github.com/acme/site.git").unwrap();
/// assert_eq!(root.subdirectory, "");
///
/// assert!(parse_github_url("https://github.com/acme/site/issues/4").is_none());
/// ```
pub fn parse_github_url(url: &str) -> Option<GithubLocation> {
    let url = url
        .trim()
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    if let Some(caps) = GITHUB_TREE_URL_RE.captures(url) {
        let subdirectory = caps.get(4).map_or("", |m| m.as_str());
        return Some(GithubLocation {
            owner: caps[1].to_string(),
            repo: strip_git_suffix(&caps[2]).to_string(),
            branch: Some(caps[3].to_string()),
            subdirectory: subdirectory.trim_matches('/').to_string(),
        });
    }

    let path_part = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let parts: Vec<&str> = path_part.split('/').filter(|s| !s.is_empty()).collect();
    if parts.len() < 2 {
        return None;
    }
    if let Some(first_segment) = parts.get(2) {
        if RESERVED_SEGMENTS.contains(first_segment) {
            return None;
        }
    }

    // Without `/tree/`, a branch name cannot be told apart from a folder
    // name, so the remainder is taken as the folder on the default branch.
    Some(GithubLocation {
        owner: parts[0].to_string(),
        repo: strip_git_suffix(parts[1]).to_string(),
        branch: None,
        subdirectory: parts[2..].join("/"),
    })
}

fn strip_git_suffix(repo: &str) -> &str {
    repo.strip_suffix(".git").unwrap_or(repo)
}

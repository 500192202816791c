// src/config/parsing.rs

use anyhow::{anyhow, Context, Result};
use byte_unit::Byte;
use std::str::FromStr;
use url::Url;

/// Parses a human-readable size ("10MiB", "512k", "1024") into bytes.
pub(super) fn parse_size(size_str: &str) -> Result<u64> {
    Byte::from_str(size_str)
        .map(|b| b.as_u64())
        .with_context(|| format!("Invalid size format: '{}'", size_str))
}

/// Validates an API base URL and strips any trailing slash.
pub(super) fn normalize_api_base(api_base: &str) -> Result<String> {
    let url = Url::parse(api_base).with_context(|| format!("Invalid API base URL: '{}'", api_base))?;
    match url.scheme() {
        "http" | "https" => Ok(api_base.trim_end_matches('/').to_string()),
        other => Err(anyhow!(
            "Unsupported API base URL scheme '{}' in '{}'",
            other,
            api_base
        )),
    }
}

/// Reads a non-empty environment variable.
pub(super) fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_size() -> Result<()> {
        assert_eq!(parse_size("10k")?, 10 * 1000);
        assert_eq!(parse_size("2MiB")?, 2 * 1024 * 1024);
        assert_eq!(parse_size("1024")?, 1024);
        Ok(())
    }

    #[test]
    fn test_parse_invalid_size() {
        let result = parse_size("lots");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid size format"));
    }

    #[test]
    fn test_normalize_api_base() -> Result<()> {
        assert_eq!(
            normalize_api_base("https://api.openai.com/v1/")?,
            "https://api.openai.com/v1"
        );
        assert_eq!(
            normalize_api_base("http://127.0.0.1:8080")?,
            "http://127.0.0.1:8080"
        );
        assert!(normalize_api_base("not a url").is_err());
        assert!(normalize_api_base("ftp://example.com").is_err());
        Ok(())
    }
}

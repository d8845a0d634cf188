//! Game version → patch parsing
//!
//! The provider has reported the client version in two shapes:
//!
//! - tag form: `Linux Version 14.15.604.8769 (Jul 26 2024/16:17:23) [PUBLIC] <Releases/14.15>`
//! - prefixed form: `Version 14.15.604.8769 (Jul 26 2024/16:17:23) [PUBLIC]`
//!
//! Both reduce to `major.minor`. The release tag wins when present.

use thiserror::Error;

const RELEASE_TAG: &str = "<Releases/";
const VERSION_PREFIX: &str = "Version ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized game version: {raw:?}")]
pub struct PatchParseError {
    pub raw: String,
}

/// Extract the canonical `major.minor` patch from a raw game version string
pub fn parse_patch(game_version: &str) -> Result<String, PatchParseError> {
    let raw = game_version.trim();

    let candidate = if let Some(idx) = raw.rfind(RELEASE_TAG) {
        raw[idx + RELEASE_TAG.len()..].trim_end_matches('>').trim()
    } else if let Some(idx) = raw.find(VERSION_PREFIX) {
        raw[idx + VERSION_PREFIX.len()..]
            .split_whitespace()
            .next()
            .unwrap_or_default()
    } else {
        raw
    };

    major_minor(candidate).ok_or_else(|| PatchParseError {
        raw: game_version.to_string(),
    })
}

fn major_minor(version: &str) -> Option<String> {
    let mut parts = version.split('.');
    let major = parts.next().filter(|p| is_number(p))?;
    let minor = parts.next().filter(|p| is_number(p))?;
    Some(format!("{}.{}", major, minor))
}

fn is_number(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_form() {
        let raw = "Linux Version 14.15.604.8769 (Jul 26 2024/16:17:23) [PUBLIC] <Releases/14.15>";
        assert_eq!(parse_patch(raw).unwrap(), "14.15");
    }

    #[test]
    fn test_prefixed_form() {
        let raw = "Version 14.15.604.8769 (Jul 26 2024/16:17:23) [PUBLIC]";
        assert_eq!(parse_patch(raw).unwrap(), "14.15");
    }

    #[test]
    fn test_tag_wins_over_prefix() {
        let raw = "Version 14.14.600.1 (Jul 10 2024/10:00:00) [PUBLIC] <Releases/14.15>";
        assert_eq!(parse_patch(raw).unwrap(), "14.15");
    }

    #[test]
    fn test_bare_version() {
        assert_eq!(parse_patch("  13.24.1 ").unwrap(), "13.24");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_patch("").is_err());
        assert!(parse_patch("Version unknown").is_err());
        assert!(parse_patch("<Releases/main>").is_err());
        assert!(parse_patch("14").is_err());
    }
}

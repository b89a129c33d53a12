use semver::Version;
use thiserror::Error;

pub const APP_NAME: &str = "Chokepoint Impact";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version format: {0}")]
    InvalidVersion(String),
}

fn parse_version_str(input: &str) -> Result<Version, VersionError> {
    let trimmed = input.trim_start_matches(|ch| ch == 'v' || ch == 'V');
    Version::parse(trimmed).map_err(|err| VersionError::InvalidVersion(err.to_string()))
}

/// Build version, preferring the git tag the binary was built from.
pub fn current_version() -> Result<Version, VersionError> {
    if let Some(tag) = GIT_TAG {
        if let Ok(version) = parse_version_str(tag) {
            return Ok(version);
        }
    }

    parse_version_str(APP_VERSION)
}

pub fn version_label() -> String {
    match current_version() {
        Ok(version) => format!("v{version}"),
        Err(_) => format!("v{}", APP_VERSION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_tags() {
        assert_eq!(parse_version_str("v1.2.3"), Ok(Version::new(1, 2, 3)));
        assert_eq!(parse_version_str("V0.9.0"), Ok(Version::new(0, 9, 0)));
        assert!(parse_version_str("release-7").is_err());
    }

    #[test]
    fn label_has_v_prefix() {
        assert!(version_label().starts_with('v'));
    }
}

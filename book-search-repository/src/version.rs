//! Backend version parsing and the compatibility gate.

use std::fmt;

use tracing::debug;

use crate::errors::SearchError;
use crate::types::EsqlResponse;

/// Major version the query façade is written against.
pub const SUPPORTED_MAJOR: i64 = 8;
/// Minor version the query façade is written against.
pub const SUPPORTED_MINOR: i64 = 15;

/// Version reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendVersion {
    pub major: i64,
    pub minor: i64,
    pub patch: Option<i64>,
}

impl fmt::Display for BackendVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

impl BackendVersion {
    /// Parse a dotted `major.minor.patch` string.
    ///
    /// Pre-release suffixes on the patch component (`8.15.0-SNAPSHOT`) are
    /// ignored.
    pub fn parse(version: &str) -> Result<Self, SearchError> {
        let mut parts = version.trim().splitn(3, '.');
        let mut component = |name: &str| -> Result<Option<i64>, SearchError> {
            parts
                .next()
                .map(|raw| {
                    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
                    digits.parse::<i64>().map_err(|_| {
                        SearchError::parse(format!("Invalid {} in version {:?}", name, version))
                    })
                })
                .transpose()
        };

        let major = component("major")?
            .ok_or_else(|| SearchError::parse(format!("Empty version {:?}", version)))?;
        let minor = component("minor")?
            .ok_or_else(|| SearchError::parse(format!("Missing minor in version {:?}", version)))?;
        let patch = component("patch")?;

        Ok(Self {
            major,
            minor,
            patch,
        })
    }

    /// Read the version from the result of the version query.
    ///
    /// Columns are looked up by name (`major`, `minor`) and fall back to the
    /// first two positions. A missing row, or cells that are null or not
    /// integers (the `dissect` did not match), mean no usable version.
    pub fn from_response(response: &EsqlResponse) -> Result<Self, SearchError> {
        if response.is_empty() {
            return Err(SearchError::NoVersion);
        }

        let component = |name: &str, position: usize| -> Result<i64, SearchError> {
            let column = response.column_index(name).unwrap_or(position);
            response.integer_at(0, column).map_err(|e| {
                debug!(component = name, error = %e, "Unreadable version cell");
                SearchError::NoVersion
            })
        };

        Ok(Self {
            major: component("major", 0)?,
            minor: component("minor", 1)?,
            patch: None,
        })
    }

    /// Whether this is exactly the supported major and minor version.
    pub fn is_supported(&self) -> bool {
        self.major == SUPPORTED_MAJOR && self.minor == SUPPORTED_MINOR
    }

    /// Fail with [`SearchError::Incompatible`] unless the version is supported.
    pub fn ensure_supported(&self) -> Result<(), SearchError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(SearchError::Incompatible {
                major: self.major,
                minor: self.minor,
                expected: format!("{}.{}", SUPPORTED_MAJOR, SUPPORTED_MINOR),
            })
        }
    }
}

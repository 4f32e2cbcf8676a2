//! Defines fundamental types used throughout the heliodon codebase.

use std::fmt;

pub mod geo;

/// Enumerates all the errors that can be reported in heliodon.
/// Authors of new location providers should try to map their errors
/// into one of these values. If no current value is appropriate, a
/// new one could be added (requiring a new release of this crate) but
/// make sure the new error code is generic enough that it may be
/// useful elsewhere. For instance, don't add an error value that is
/// specific to one geolocation service. Add a more general value and
/// use the associated description string to explain the details.

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// The requested operation couldn't complete. The description
    /// field will have more information for the user.
    OperationError(String),

    /// A bad parameter was given in a configuration or a
    /// configuration was missing a required parameter.
    ConfigError(String),

    /// There was a problem parsing a string. The associated string
    /// will describe how the parsing failed.
    ParseError(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OperationError(v) => {
                write!(f, "couldn't complete operation: {}", &v)
            }
            Error::ConfigError(v) => write!(f, "config error: {}", &v),
            Error::ParseError(v) => write!(f, "parse error: {}", &v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::OperationError(String::from("det")).to_string(),
            "couldn't complete operation: det"
        );
        assert_eq!(
            Error::ConfigError(String::from("det")).to_string(),
            "config error: det"
        );
        assert_eq!(
            Error::ParseError(String::from("det")).to_string(),
            "parse error: det"
        );
    }
}

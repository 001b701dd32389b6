use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use url::Url;

/// Represents a dsn url parsing error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDsnError {
    /// raised on completely invalid urls
    #[error("no valid url provided")]
    InvalidUrl,
    /// raised the scheme is invalid / unsupported.
    #[error("no valid scheme")]
    InvalidScheme,
    /// raised if the url carries no host.
    #[error("missing host")]
    NoHost,
}

/// Represents the scheme of an url http/https.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Scheme {
    /// unencrypted HTTP scheme
    Http,
    /// encrypted HTTPS scheme
    Https,
}

impl Scheme {
    /// Returns the default port for this scheme.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                Scheme::Https => "https",
                Scheme::Http => "http",
            }
        )
    }
}

/// Represents the destination of all reports.
///
/// Unlike a classic DSN there is no embedded key: the ingestion endpoint
/// identifies the monitored application from the last path component, for
/// instance `http://localhost:3000/tracing/fewjonqks`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Dsn {
    scheme: Scheme,
    url: Url,
}

impl Dsn {
    /// Returns the scheme
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the host
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Returns the port
    pub fn port(&self) -> u16 {
        self.url
            .port()
            .unwrap_or_else(|| self.scheme.default_port())
    }

    /// Returns the application identifier, the last non-empty path segment.
    pub fn app_id(&self) -> Option<&str> {
        self.url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
    }

    /// Returns the URL reports are posted to.
    pub fn report_url(&self) -> &Url {
        &self.url
    }

    /// Returns the URL used by the image-request fallback.
    ///
    /// The serialized report travels in the `data` query parameter, appended
    /// to whatever query the DSN already carries.
    pub fn image_url(&self, data: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("data", data);
        url
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl FromStr for Dsn {
    type Err = ParseDsnError;

    fn from_str(s: &str) -> Result<Dsn, ParseDsnError> {
        let url = Url::parse(s).map_err(|_| ParseDsnError::InvalidUrl)?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            _ => return Err(ParseDsnError::InvalidScheme),
        };

        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(ParseDsnError::NoHost),
        }

        Ok(Dsn { scheme, url })
    }
}

impl Serialize for Dsn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dsn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Exchange symbol (e.g. `PETR4.SA`, `AAPL`).
///
/// Tickers double as partition file names and chart URL path segments, so
/// construction accepts only ASCII alphanumerics and `. - ^ = _`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

/// Why a symbol string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ticker '{symbol}': {reason}")]
pub struct InvalidTicker {
    pub symbol: String,
    pub reason: &'static str,
}

impl Ticker {
    pub fn new(symbol: impl Into<String>) -> Result<Self, InvalidTicker> {
        let symbol = symbol.into();
        let reason = if symbol.is_empty() {
            Some("empty symbol")
        } else if symbol.chars().any(char::is_whitespace) {
            Some("contains whitespace")
        } else if symbol.contains(['/', '\\']) {
            Some("contains a path separator")
        } else if symbol == "." || symbol == ".." {
            Some("reserved path component")
        } else if !symbol.chars().all(is_symbol_char) {
            Some("contains a character not allowed in a symbol")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidTicker { symbol, reason }),
            None => Ok(Self(symbol)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_')
}

impl TryFrom<String> for Ticker {
    type Error = InvalidTicker;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exchange_suffixes_and_indices() {
        assert_eq!(Ticker::new("PETR4.SA").unwrap().as_str(), "PETR4.SA");
        assert!(Ticker::new("^BVSP").is_ok());
        assert!(Ticker::new("BRK-B").is_ok());
        assert!(Ticker::new("EURUSD=X").is_ok());
    }

    #[test]
    fn rejects_url_metacharacters() {
        for symbol in ["A?x=1", "A#B", "A%2FB", "A&B", "AÇÚCAR"] {
            let err = Ticker::new(symbol).unwrap_err();
            assert_eq!(err.reason, "contains a character not allowed in a symbol");
        }
    }

    #[test]
    fn rejects_path_like_symbols() {
        assert!(Ticker::new("").is_err());
        assert!(Ticker::new("..").is_err());
        assert!(Ticker::new("A/B").is_err());
        assert!(Ticker::new("A\\B").is_err());
        assert!(Ticker::new("AA PL").is_err());
    }

    #[test]
    fn equality_is_by_value() {
        assert_eq!(Ticker::new("AAPL").unwrap(), Ticker::new("AAPL").unwrap());
        assert_ne!(Ticker::new("AAPL").unwrap(), Ticker::new("aapl").unwrap());
    }

    #[test]
    fn deserialization_validates() {
        let ok: Ticker = serde_json::from_str("\"VALE3.SA\"").unwrap();
        assert_eq!(ok.to_string(), "VALE3.SA");
        assert!(serde_json::from_str::<Ticker>("\"../etc\"").is_err());
    }
}

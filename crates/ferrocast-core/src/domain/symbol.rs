use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Crypto pairs offered by the interactive front-end.
pub const SUPPORTED_CRYPTOS: [&str; 9] = [
    "BTC-USD", "ETH-USD", "ADA-USD", "XRP-USD", "SOL-USD", "MATIC-USD", "LINK-USD", "FTM-USD",
    "LTC-USD",
];

/// Normalized market ticker such as `BTC-USD`.
///
/// The normalized string is also the loader cache key, so two spellings that
/// normalize to the same ticker share one cache entry and nothing else does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a ticker to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphabetic() {
                return Err(ValidationError::SymbolInvalidStart { ch: first });
            }
        }

        if let Some((index, ch)) = normalized
            .chars()
            .enumerate()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '.' || *ch == '-'))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quote currency of a `BASE-QUOTE` pair, if the ticker has that shape.
    pub fn quote_currency(&self) -> Option<&str> {
        self.0
            .split_once('-')
            .map(|(_, quote)| quote)
            .filter(|quote| !quote.is_empty())
    }

    pub fn is_supported_crypto(&self) -> bool {
        SUPPORTED_CRYPTOS.contains(&self.as_str())
    }

    pub fn supported() -> Vec<Self> {
        SUPPORTED_CRYPTOS
            .iter()
            .map(|ticker| Self((*ticker).to_owned()))
            .collect()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

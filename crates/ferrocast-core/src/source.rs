use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identifiers of the market-data sources a loader can be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Yahoo,
    Csv,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::Yahoo, Self::Csv];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Csv => "csv",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}


use serde::Serialize;

use ferrocast_core::{ProviderId, Symbol};

use crate::error::CliError;

use super::{source_label, CommandResult};

#[derive(Debug, Serialize)]
struct SourceInfo {
    id: ProviderId,
    description: &'static str,
}

#[derive(Debug, Serialize)]
struct SymbolsResponseData {
    symbols: Vec<Symbol>,
    sources: Vec<SourceInfo>,
}

pub fn run() -> Result<CommandResult, CliError> {
    let sources = ProviderId::ALL
        .into_iter()
        .map(|id| SourceInfo {
            id,
            description: source_label(id),
        })
        .collect();

    let data = serde_json::to_value(SymbolsResponseData {
        symbols: Symbol::supported(),
        sources,
    })?;

    Ok(CommandResult::ok(data))
}

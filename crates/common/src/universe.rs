use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Category, Instrument};

/// The 28 forex crosses watched by default.
const FOREX_PAIRS: &[&str] = &[
    "EURUSD", "GBPUSD", "USDJPY", "AUDUSD", "USDCAD", "USDCHF", "NZDUSD", "EURGBP", "EURJPY",
    "GBPJPY", "EURAUD", "EURCAD", "EURCHF", "EURNZD", "GBPAUD", "GBPCAD", "GBPCHF", "GBPNZD",
    "AUDJPY", "AUDCAD", "AUDCHF", "AUDNZD", "CADJPY", "CADCHF", "CHFJPY", "NZDJPY", "NZDCAD",
    "NZDCHF",
];

/// Built-in instrument universe: the forex crosses plus BTCUSD.
pub fn default_universe() -> Vec<Instrument> {
    let mut instruments: Vec<Instrument> = FOREX_PAIRS
        .iter()
        .map(|s| Instrument::new(*s, Category::Forex))
        .collect();
    instruments.push(Instrument::new("BTCUSD", Category::Crypto));
    instruments
}

/// Optional TOML override of the universe.
///
/// Example `config/instruments.toml`:
/// ```toml
/// [[instrument]]
/// symbol = "EURUSD"
/// category = "FOREX"
///
/// [[instrument]]
/// symbol = "BTCUSD"
/// category = "CRYPTO"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniverseFileConfig {
    #[serde(rename = "instrument")]
    pub instruments: Vec<InstrumentEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstrumentEntry {
    pub symbol: String,
    pub category: Category,
}

/// Load the universe from `path` if present, falling back to the built-in
/// list. A present-but-unreadable file is a configuration mistake and
/// panics with a clear message.
pub fn load_universe(path: &str) -> Vec<Instrument> {
    if !Path::new(path).exists() {
        return default_universe();
    }
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read instrument config at '{path}': {e}"));
    let file: UniverseFileConfig = toml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse instrument config at '{path}': {e}"));
    file.instruments
        .into_iter()
        .map(|e| Instrument::new(e.symbol, e.category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_universe_has_one_crypto_pair() {
        let universe = default_universe();
        assert_eq!(universe.len(), 29);
        let cryptos: Vec<_> = universe
            .iter()
            .filter(|i| i.category == Category::Crypto)
            .collect();
        assert_eq!(cryptos.len(), 1);
        assert_eq!(cryptos[0].symbol, "BTCUSD");
    }

    #[test]
    fn universe_symbols_are_unique() {
        let universe = default_universe();
        let mut symbols: Vec<_> = universe.iter().map(|i| i.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), universe.len());
    }

    #[test]
    fn toml_override_parses() {
        let toml_src = r#"
            [[instrument]]
            symbol = "EURUSD"
            category = "FOREX"

            [[instrument]]
            symbol = "BTCUSD"
            category = "CRYPTO"
        "#;
        let file: UniverseFileConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(file.instruments.len(), 2);
        assert_eq!(file.instruments[1].category, Category::Crypto);
    }
}

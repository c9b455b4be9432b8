use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Candle, Category, Error, Instrument, MarketData, PriceSeries, Result, Timeframe};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Chart-API client for Yahoo Finance. One GET per instrument/timeframe,
/// no authentication.
pub struct YahooClient {
    base_url: String,
    http: Client,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::builder()
                .use_rustls_tls()
                .user_agent("sniper-engine")
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn fetch(&self, instrument: &Instrument, timeframe: Timeframe) -> Result<PriceSeries> {
        let symbol = provider_symbol(instrument);
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url,
            symbol,
            timeframe.range(),
            timeframe.interval()
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Provider(format!(
                "HTTP {status} fetching {symbol} {timeframe}"
            )));
        }

        let body: ChartResponse = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
        if let Some(err) = body.chart.error {
            return Err(Error::Provider(format!("{}: {}", err.code, err.description)));
        }
        let result = body
            .chart
            .result
            .and_then(|mut r| (!r.is_empty()).then(|| r.remove(0)))
            .ok_or_else(|| Error::Provider(format!("empty chart result for {symbol}")))?;

        let series = build_series(result);
        debug!(%symbol, %timeframe, candles = series.len(), "series fetched");
        Ok(series)
    }
}

/// Provider ticker for an instrument: forex pairs quote as "EURUSD=X",
/// crypto as "BTC-USD".
fn provider_symbol(instrument: &Instrument) -> String {
    match instrument.category {
        Category::Forex => format!("{}=X", instrument.symbol),
        Category::Crypto => {
            let base = instrument
                .symbol
                .strip_suffix("USD")
                .unwrap_or(&instrument.symbol);
            format!("{base}-USD")
        }
    }
}

/// Rows with any missing or non-finite OHLC field are dropped, matching the
/// upstream feed's sparse output for illiquid sessions.
fn build_series(result: ChartResult) -> PriceSeries {
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let mut candles = Vec::with_capacity(result.timestamp.len());

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        ) else {
            continue;
        };
        if ![open, high, low, close].iter().all(|v| v.is_finite()) {
            continue;
        }
        let Some(timestamp) = Utc.timestamp_opt(ts, 0).single() else {
            continue;
        };
        candles.push(Candle {
            open,
            high,
            low,
            close,
            timestamp,
        });
    }

    PriceSeries::new(candles)
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChartResponse {
    chart: ChartNode,
}

#[derive(Deserialize)]
struct ChartNode {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize, Default)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_symbols() {
        assert_eq!(
            provider_symbol(&Instrument::new("EURUSD", Category::Forex)),
            "EURUSD=X"
        );
        assert_eq!(
            provider_symbol(&Instrument::new("BTCUSD", Category::Crypto)),
            "BTC-USD"
        );
    }

    #[test]
    fn chart_payload_parses_and_drops_null_rows() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1717570800, 1717571700, 1717572600],
                    "indicators": {
                        "quote": [{
                            "open":  [1.1000, null, 1.1010],
                            "high":  [1.1005, 1.1011, 1.1015],
                            "low":   [1.0995, 1.1001, 1.1005],
                            "close": [1.1002, 1.1008, 1.1012]
                        }]
                    }
                }],
                "error": null
            }
        }"#;
        let parsed: ChartResponse = serde_json::from_str(body).unwrap();
        let result = parsed.chart.result.unwrap().remove(0);
        let series = build_series(result);

        // The middle row has a null open and is dropped
        assert_eq!(series.len(), 2);
        assert_eq!(series.candles[0].close, 1.1002);
        assert_eq!(series.candles[1].close, 1.1012);
        assert!(series.validate("EURUSD", Timeframe::M15).is_ok());
    }

    #[test]
    fn provider_error_node_parses() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        }"#;
        let parsed: ChartResponse = serde_json::from_str(body).unwrap();
        let err = parsed.chart.error.unwrap();
        assert_eq!(err.code, "Not Found");
    }

    #[test]
    fn timeframe_request_parameters() {
        assert_eq!(Timeframe::M15.range(), "7d");
        assert_eq!(Timeframe::M15.interval(), "15m");
        assert_eq!(Timeframe::H1.range(), "30d");
        assert_eq!(Timeframe::D1.range(), "200d");
    }
}

//! JSON snapshot feed.
//!
//! Input is an array of recorded tick objects. Depth maps arrive with string
//! price keys, and ask quantities may be negative-encoded; both are
//! normalized here so the rest of the system only ever sees positive
//! quantities keyed by integer price. Zero-quantity levels are dropped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use shd_model::{ConversionObservation, Listing, MarketSnapshot, OrderDepth, Trade};

use crate::{check_monotonic, FeedError};

/// Load a JSON snapshot array from disk.
pub fn load_json_feed(path: impl AsRef<Path>) -> Result<Vec<MarketSnapshot>, FeedError> {
    let s = fs::read_to_string(path)?;
    parse_json_feed(&s)
}

/// Parse a JSON snapshot array (pure, deterministic).
pub fn parse_json_feed(content: &str) -> Result<Vec<MarketSnapshot>, FeedError> {
    if content.trim().is_empty() {
        return Err(FeedError::EmptyInput);
    }

    let raw: Vec<RawSnapshot> = serde_json::from_str(content)?;
    let mut out = Vec::with_capacity(raw.len());
    for r in raw {
        out.push(r.normalize()?);
    }

    out.sort_by_key(|s| s.timestamp);
    check_monotonic(&out)?;
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    timestamp: i64,
    #[serde(default)]
    listings: BTreeMap<String, RawListing>,
    #[serde(default)]
    order_depths: BTreeMap<String, RawDepth>,
    #[serde(default)]
    market_trades: BTreeMap<String, Vec<RawTrade>>,
    #[serde(default)]
    own_trades: BTreeMap<String, Vec<RawTrade>>,
    #[serde(default)]
    position: BTreeMap<String, i64>,
    #[serde(default)]
    observations: RawObservations,
}

#[derive(Debug, Deserialize)]
struct RawListing {
    symbol: String,
    product: String,
    #[serde(default)]
    denomination: String,
}

/// String-keyed price maps, as the recorder writes them.
#[derive(Debug, Default, Deserialize)]
struct RawDepth {
    #[serde(default)]
    buy_orders: BTreeMap<String, i64>,
    #[serde(default)]
    sell_orders: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct RawTrade {
    symbol: String,
    price: i64,
    quantity: i64,
    #[serde(default)]
    buyer: Option<String>,
    #[serde(default)]
    seller: Option<String>,
    timestamp: i64,
}

#[derive(Debug, Default, Deserialize)]
struct RawObservations {
    #[serde(default, rename = "plainValueObservations")]
    plain: BTreeMap<String, f64>,
    #[serde(default, rename = "conversionObservations")]
    conversions: BTreeMap<String, RawConversion>,
}

#[derive(Debug, Deserialize)]
struct RawConversion {
    #[serde(default, rename = "bidPrice")]
    bid_price: f64,
    #[serde(default, rename = "askPrice")]
    ask_price: f64,
    #[serde(default, rename = "transportFees")]
    transport_fees: f64,
    #[serde(default, rename = "exportTariff")]
    export_tariff: f64,
    #[serde(default, rename = "importTariff")]
    import_tariff: f64,
}

impl RawSnapshot {
    fn normalize(self) -> Result<MarketSnapshot, FeedError> {
        let mut snap = MarketSnapshot {
            timestamp: self.timestamp,
            ..MarketSnapshot::default()
        };

        for (symbol, l) in self.listings {
            snap.listings
                .insert(symbol, Listing::new(l.symbol, l.product, l.denomination));
        }

        for (symbol, raw) in self.order_depths {
            let mut depth = OrderDepth::new();
            for (key, qty) in &raw.buy_orders {
                let price = parse_price(&symbol, key)?;
                if *qty != 0 {
                    depth.buy_orders.insert(price, qty.abs());
                }
            }
            for (key, qty) in &raw.sell_orders {
                let price = parse_price(&symbol, key)?;
                // ask quantities are negative-encoded in the recorded feed
                if *qty != 0 {
                    depth.sell_orders.insert(price, qty.abs());
                }
            }
            snap.order_depths.insert(symbol, depth);
        }

        for (symbol, trades) in self.market_trades {
            snap.market_trades
                .insert(symbol, trades.into_iter().map(RawTrade::normalize).collect());
        }
        for (symbol, trades) in self.own_trades {
            snap.own_trades
                .insert(symbol, trades.into_iter().map(RawTrade::normalize).collect());
        }

        snap.position = self.position;

        for (symbol, value) in self.observations.plain {
            snap.plain_observations.insert(symbol, value.round() as i64);
        }
        for (symbol, c) in self.observations.conversions {
            snap.conversion_observations.insert(
                symbol,
                ConversionObservation {
                    bid_price: c.bid_price,
                    ask_price: c.ask_price,
                    transport_fees: c.transport_fees,
                    export_tariff: c.export_tariff,
                    import_tariff: c.import_tariff,
                },
            );
        }

        Ok(snap)
    }
}

impl RawTrade {
    fn normalize(self) -> Trade {
        Trade::new(
            self.symbol,
            self.price,
            self.quantity,
            self.buyer.unwrap_or_default(),
            self.seller.unwrap_or_default(),
            self.timestamp,
        )
    }
}

fn parse_price(symbol: &str, key: &str) -> Result<i64, FeedError> {
    key.trim()
        .parse::<i64>()
        .map_err(|_| FeedError::BadDepthKey {
            symbol: symbol.to_string(),
            key: key.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: &str = r#"[
      {
        "timestamp": 100,
        "listings": { "X": { "symbol": "X", "product": "X", "denomination": "" } },
        "order_depths": {
          "X": { "buy_orders": { "99": 5, "98": 3 }, "sell_orders": { "101": -4 } }
        },
        "market_trades": {
          "X": [ { "symbol": "X", "price": 100, "quantity": 2,
                   "buyer": null, "seller": "ANON", "timestamp": 0 } ]
        },
        "own_trades": {},
        "position": { "X": 0 },
        "observations": {
          "plainValueObservations": { "X": 100.0 },
          "conversionObservations": {}
        }
      },
      { "timestamp": 200, "order_depths": { "X": { "buy_orders": {}, "sell_orders": {} } } }
    ]"#;

    #[test]
    fn parses_and_normalizes_depth() {
        let snaps = parse_json_feed(TICK).expect("parse");
        assert_eq!(snaps.len(), 2);

        let d = snaps[0].depth("X").expect("depth");
        assert_eq!(d.best_bid(), Some(99));
        // negative-encoded ask normalized to positive
        assert_eq!(d.sell_orders.get(&101), Some(&4));
    }

    #[test]
    fn null_counterparties_become_empty_tags() {
        let snaps = parse_json_feed(TICK).expect("parse");
        let trades = snaps[0].market_trades_for("X");
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buyer, "");
        assert_eq!(trades[0].seller, "ANON");
    }

    #[test]
    fn plain_observations_are_rounded() {
        let snaps = parse_json_feed(TICK).expect("parse");
        assert_eq!(snaps[0].plain_observations.get("X"), Some(&100));
    }

    #[test]
    fn duplicate_timestamps_rejected() {
        let content = r#"[ { "timestamp": 100 }, { "timestamp": 100 } ]"#;
        assert_eq!(
            parse_json_feed(content),
            Err(FeedError::NonMonotonicTimestamp {
                prev: 100,
                next: 100
            })
        );
    }

    #[test]
    fn out_of_order_input_is_sorted() {
        let content = r#"[ { "timestamp": 200 }, { "timestamp": 100 } ]"#;
        let snaps = parse_json_feed(content).expect("parse");
        assert_eq!(snaps[0].timestamp, 100);
        assert_eq!(snaps[1].timestamp, 200);
    }

    #[test]
    fn bad_price_key_is_fatal() {
        let content = r#"[ { "timestamp": 100,
          "order_depths": { "X": { "buy_orders": { "abc": 5 }, "sell_orders": {} } } } ]"#;
        match parse_json_feed(content) {
            Err(FeedError::BadDepthKey { symbol, key }) => {
                assert_eq!(symbol, "X");
                assert_eq!(key, "abc");
            }
            other => panic!("expected BadDepthKey, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_rejected() {
        assert_eq!(parse_json_feed("  "), Err(FeedError::EmptyInput));
    }

    #[test]
    fn zero_quantity_levels_dropped() {
        let content = r#"[ { "timestamp": 100,
          "order_depths": { "X": { "buy_orders": { "99": 0 }, "sell_orders": { "101": -3 } } } } ]"#;
        let snaps = parse_json_feed(content).expect("parse");
        let d = snaps[0].depth("X").expect("depth");
        assert!(d.buy_orders.is_empty());
        assert_eq!(d.sell_orders.len(), 1);
    }
}

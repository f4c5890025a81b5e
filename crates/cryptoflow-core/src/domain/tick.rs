//! Wire format for the real-time price channel.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The single message shape carried on the pub/sub channel and forwarded
/// verbatim to WebSocket clients:
///
/// ```json
/// {"type": "price_update", "prices": {"bitcoin": 43521.12}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Always "price_update"
    #[serde(rename = "type")]
    pub kind: String,
    /// Internal asset identifier to latest price
    pub prices: BTreeMap<String, f64>,
}

impl PriceUpdate {
    pub const KIND: &'static str = "price_update";

    pub fn new(prices: BTreeMap<String, f64>) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            prices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let mut prices = BTreeMap::new();
        prices.insert("bitcoin".to_string(), 43521.12);
        let update = PriceUpdate::new(prices);

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["type"], "price_update");
        assert_eq!(json["prices"]["bitcoin"], 43521.12);
    }

    #[test]
    fn deserializes_from_wire_shape() {
        let update: PriceUpdate =
            serde_json::from_str(r#"{"type":"price_update","prices":{"ethereum":2234.56}}"#)
                .unwrap();
        assert_eq!(update.kind, PriceUpdate::KIND);
        assert_eq!(update.prices["ethereum"], 2234.56);
    }
}

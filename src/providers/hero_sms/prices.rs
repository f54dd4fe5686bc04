//! Price extraction from getPrices payloads.
//!
//! The price table comes in several shapes depending on the query and the
//! API revision. Each shape is a lookup function; they are tried in order
//! and the first one yielding a parsable `cost` wins.

use crate::types::{CountryId, Price};
use serde_json::Value;

type ShapeLookup = for<'a> fn(&'a Value, &str, &str) -> Option<&'a Value>;

/// Known payload shapes, most specific first.
const PRICE_SHAPES: [(&str, ShapeLookup); 3] = [
    ("country_service", by_country_then_service),
    ("service", by_service),
    ("list", in_list),
];

/// `{"73": {"mm": {"cost": 0.25, "count": 100}}}`
fn by_country_then_service<'a>(data: &'a Value, country: &str, service: &str) -> Option<&'a Value> {
    data.get(country)?.get(service).filter(|v| v.is_object())
}

/// `{"mm": {"cost": 0.25, "count": 100}}`
fn by_service<'a>(data: &'a Value, _country: &str, service: &str) -> Option<&'a Value> {
    data.as_object()?.get(service).filter(|v| v.is_object())
}

/// `[{"mm": {"cost": 0.25}}, ...]`
fn in_list<'a>(data: &'a Value, _country: &str, service: &str) -> Option<&'a Value> {
    data.as_array()?
        .iter()
        .find_map(|item| item.get(service).filter(|v| v.is_object()))
}

/// `cost` as a JSON number or numeric string.
fn cost_of(entry: &Value) -> Option<Price> {
    match entry.get("cost")? {
        Value::Number(n) => n.to_string().parse::<Price>().ok(),
        Value::String(s) => s.parse::<Price>().ok(),
        _ => None,
    }
}

/// First payload shape yielding a price, with its name.
fn find_price(data: &Value, country: CountryId, service: &str) -> Option<(&'static str, Price)> {
    let country = country.to_string();
    PRICE_SHAPES.iter().find_map(|(name, lookup)| {
        lookup(data, &country, service)
            .and_then(cost_of)
            .map(|price| (*name, price))
    })
}

/// Extract the rental price for `service` in `country` from a getPrices payload.
pub fn extract_price(data: &Value, country: CountryId, service: &str) -> Option<Price> {
    let (_shape, price) = find_price(data, country, service)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        shape = _shape,
        service,
        country = %country,
        price = %price,
        "Price extracted"
    );

    Some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BRAZIL: CountryId = CountryId::new(73);

    #[test]
    fn test_nested_country_service_shape() {
        let data = json!({"73": {"mm": {"cost": 0.25, "count": 120}}});
        assert_eq!(extract_price(&data, BRAZIL, "mm"), Price::new(0.25).ok());
    }

    #[test]
    fn test_service_shape() {
        let data = json!({"mm": {"cost": "0.30", "count": 5}});
        assert_eq!(extract_price(&data, BRAZIL, "mm"), Price::new(0.30).ok());
    }

    #[test]
    fn test_list_shape() {
        let data = json!([{"wa": {"cost": 1.0}}, {"mm": {"cost": 0.12}}]);
        assert_eq!(extract_price(&data, BRAZIL, "mm"), Price::new(0.12).ok());
    }

    #[test]
    fn test_country_shape_wins_over_service_shape() {
        let data = json!({
            "73": {"mm": {"cost": 0.25}},
            "mm": {"cost": 9.99}
        });
        assert_eq!(extract_price(&data, BRAZIL, "mm"), Price::new(0.25).ok());
    }

    #[test]
    fn test_falls_through_when_cost_missing() {
        let data = json!({
            "73": {"mm": {"count": 10}},
            "mm": {"cost": 0.4}
        });
        assert_eq!(extract_price(&data, BRAZIL, "mm"), Price::new(0.4).ok());
    }

    #[test]
    fn test_reports_matching_shape() {
        let nested = json!({"73": {"mm": {"cost": 0.25}}});
        let flat = json!({"mm": {"cost": 0.25}});
        let list = json!([{"mm": {"cost": 0.25}}]);

        let shape = |data: &Value| find_price(data, BRAZIL, "mm").map(|(name, _)| name);
        assert_eq!(shape(&nested), Some("country_service"));
        assert_eq!(shape(&flat), Some("service"));
        assert_eq!(shape(&list), Some("list"));
    }

    #[test]
    fn test_missing_service_or_country() {
        let data = json!({"22": {"mm": {"cost": 0.25}}});
        assert_eq!(extract_price(&data, BRAZIL, "mm"), None);
        assert_eq!(extract_price(&json!([]), BRAZIL, "mm"), None);
        assert_eq!(extract_price(&json!("ERROR"), BRAZIL, "mm"), None);
    }
}

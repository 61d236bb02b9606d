use serde::Deserialize;
use serde_json::Value;

/// The two fields of an Etsy shop record the resolver cares about.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShopSummary {
    pub shop_id: u64,
    #[serde(default)]
    pub shop_name: String,
}

/// Reads shop records out of an Etsy response body.
///
/// Collection endpoints wrap records in `{"count": n, "results": [...]}`, while
/// `/users/{id}/shops` may answer with a single shop object.
pub fn shops_from_body(body: &Value) -> Vec<ShopSummary> {
    if let Some(results) = body.get("results").and_then(Value::as_array) {
        return results
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect();
    }
    if body.get("shop_id").is_some() {
        return serde_json::from_value(body.clone()).into_iter().collect();
    }
    Vec::new()
}

use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query string accepted by the product routes.
///
/// Everything is kept as raw text: `page` and `limit` are coerced by the
/// paginator rather than rejected by the extractor, and `ids` is only a
/// presence flag.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub ids: Option<String>,
}

impl ProductQuery {
    /// `?ids=` with an empty value counts as absent.
    pub fn wants_lookup(&self) -> bool {
        self.ids.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Acknowledgement returned after a single insert.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

/// Renders a stored value the way JavaScript clients print it: object ids as
/// bare hex strings, dates as RFC 3339, everything else as relaxed extended
/// JSON.
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Bson::DateTime(dt).into_relaxed_extjson(),
        },
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

pub fn document_to_json(doc: Document) -> Value {
    Value::Object(doc.into_iter().map(|(k, v)| (k, bson_to_json(v))).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId, DateTime};
    use serde_json::json;

    #[test]
    fn object_ids_render_as_hex() {
        let id = ObjectId::parse_str("65f1c0ffee00000000000001").unwrap();
        let rendered = document_to_json(doc! { "_id": id, "name": "Walkie", "price": 42 });

        assert_eq!(
            rendered,
            json!({ "_id": "65f1c0ffee00000000000001", "name": "Walkie", "price": 42 })
        );
    }

    #[test]
    fn nested_values_are_converted() {
        let id = ObjectId::parse_str("65f1c0ffee00000000000002").unwrap();
        let rendered = document_to_json(doc! {
            "related": [id],
            "spec": { "band": "FM", "range_km": 2.5 },
            "added": DateTime::from_millis(0),
        });

        assert_eq!(rendered["related"], json!(["65f1c0ffee00000000000002"]));
        assert_eq!(rendered["spec"], json!({ "band": "FM", "range_km": 2.5 }));
        assert_eq!(rendered["added"], json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn empty_ids_flag_is_ignored() {
        let query = ProductQuery {
            ids: Some(String::new()),
            ..Default::default()
        };
        assert!(!query.wants_lookup());

        let query = ProductQuery {
            ids: Some("1".to_string()),
            ..Default::default()
        };
        assert!(query.wants_lookup());
    }
}

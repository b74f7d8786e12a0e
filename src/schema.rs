//! Record schema and discovery catalog

use crate::stream::{Dimension, StreamDefinition, BOOKMARK_PROPERTY};
use serde_json::{json, Map, Value};

/// JSON schema shared by every stream's records
pub fn record_schema() -> Value {
    let mut properties = Map::new();
    for dim in Dimension::all() {
        properties.insert(dim.to_string(), json!({"type": ["null", "string"]}));
    }
    properties.insert(
        "timestamp".to_string(),
        json!({"type": "string", "format": "date"}),
    );
    properties.insert("site_url".to_string(), json!({"type": "string"}));
    properties.insert("clicks".to_string(), json!({"type": ["null", "integer"]}));
    properties.insert(
        "impressions".to_string(),
        json!({"type": ["null", "integer"]}),
    );
    properties.insert("ctr".to_string(), json!({"type": ["null", "number"]}));
    properties.insert("position".to_string(), json!({"type": ["null", "number"]}));

    json!({
        "type": "object",
        "properties": properties,
    })
}

/// Discovery catalog for a stream
pub fn catalog(stream: &StreamDefinition) -> Value {
    json!({
        "streams": [{
            "tap_stream_id": stream.id(),
            "stream": stream.id(),
            "key_properties": stream.key_properties(),
            "bookmark_properties": [BOOKMARK_PROPERTY],
            "schema": record_schema(),
        }]
    })
}

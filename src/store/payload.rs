//! Payload schema for Qdrant points

use crate::chunk::{compute_text_hash, Chunk};
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{ListValue, PointStruct, Struct, Value as QdrantValue};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Namespace for deriving point UUIDs from chunk ids
const CHUNK_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6f, 0x1c, 0x2a, 0x4e, 0x93, 0x0b, 0x4d, 0x52, 0xa7, 0x5e, 0x1f, 0x88, 0x3c, 0x90, 0xd2, 0x14,
]);

/// Deterministic point id for a chunk id such as `doc-3`
pub fn point_id_for(chunk_id: &str) -> Uuid {
    Uuid::new_v5(&CHUNK_ID_NAMESPACE, chunk_id.as_bytes())
}

/// A point ready to be upserted to Qdrant
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl ChunkPoint {
    pub fn new(chunk_id: String, chunk: Chunk, vector: Vec<f32>, ingested_at: String) -> Self {
        Self {
            id: point_id_for(&chunk_id),
            vector,
            payload: ChunkPayload::new(chunk_id, chunk, ingested_at),
        }
    }

    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

/// Payload stored with each chunk in Qdrant
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPayload {
    /// Sequential chunk id (`doc-N`)
    pub chunk_id: String,

    /// Chunk text
    pub page_content: String,

    /// Enriched chunk metadata
    pub metadata: Map<String, Value>,

    /// Hash of the chunk content
    pub chunk_hash: String,

    /// When this chunk was written
    pub ingested_at: String,
}

impl ChunkPayload {
    pub fn new(chunk_id: String, chunk: Chunk, ingested_at: String) -> Self {
        Self {
            chunk_hash: compute_text_hash(&chunk.page_content),
            chunk_id,
            page_content: chunk.page_content,
            metadata: chunk.metadata,
            ingested_at,
        }
    }

    /// Rebuild the chunk this payload was created from
    pub fn to_chunk(&self) -> Chunk {
        Chunk {
            page_content: self.page_content.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("chunk_id".to_string(), string_to_qdrant(self.chunk_id));
        map.insert("page_content".to_string(), string_to_qdrant(self.page_content));
        map.insert(
            "metadata".to_string(),
            json_to_qdrant_value(Value::Object(self.metadata)),
        );
        map.insert("chunk_hash".to_string(), string_to_qdrant(self.chunk_hash));
        map.insert("ingested_at".to_string(), string_to_qdrant(self.ingested_at));

        map
    }

    /// Read a payload back from a search hit; missing fields become empty
    pub fn from_qdrant_payload(payload: HashMap<String, QdrantValue>) -> Self {
        let mut fields: Map<String, Value> = payload
            .into_iter()
            .map(|(k, v)| (k, json_from_qdrant_value(v)))
            .collect();

        let mut take_string = |key: &str| match fields.remove(key) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };

        let chunk_id = take_string("chunk_id");
        let page_content = take_string("page_content");
        let chunk_hash = take_string("chunk_hash");
        let ingested_at = take_string("ingested_at");
        let metadata = match fields.remove("metadata") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Self {
            chunk_id,
            page_content,
            metadata,
            chunk_hash,
            ingested_at,
        }
    }
}

fn string_to_qdrant(s: String) -> QdrantValue {
    QdrantValue {
        kind: Some(Kind::StringValue(s)),
    }
}

/// Convert serde_json Value to Qdrant value
pub fn json_to_qdrant_value(v: Value) -> QdrantValue {
    let kind = match v {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant_value).collect(),
        }),
        Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, json_to_qdrant_value(v)))
                .collect(),
        }),
    };

    QdrantValue { kind: Some(kind) }
}

/// Convert Qdrant value to serde_json Value
pub fn json_from_qdrant_value(v: QdrantValue) -> Value {
    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(
            list.values
                .into_iter()
                .map(json_from_qdrant_value)
                .collect(),
        ),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}

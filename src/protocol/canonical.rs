use serde::{Deserialize, Deserializer, Serialize};

use crate::fc::tool_id::{normalize, NormalizedId};

/// A single tool-call entry as carried by a generation message.
///
/// Accepts both the flat `{"name", "args" | "arguments", "id"}` shape and the
/// `OpenAI` wire shape `{"id", "type": "function", "function": {"name",
/// "arguments"}}`. Missing pieces are filled in rather than rejected: a
/// missing name reads as `""`, missing arguments read as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct ToolCallEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl From<serde_json::Value> for ToolCallEntry {
    fn from(value: serde_json::Value) -> Self {
        let serde_json::Value::Object(mut obj) = value else {
            return Self {
                id: None,
                name: String::new(),
                arguments: serde_json::Value::Null,
            };
        };

        let id = match obj.remove("id") {
            Some(serde_json::Value::String(id)) => Some(id),
            _ => None,
        };

        // OpenAI wire shape nests name/arguments under `function`.
        let mut source = match obj.remove("function") {
            Some(serde_json::Value::Object(function)) => function,
            _ => obj,
        };

        let name = match source.remove("name") {
            Some(serde_json::Value::String(name)) => name,
            _ => String::new(),
        };
        let arguments = source
            .remove("args")
            .or_else(|| source.remove("arguments"))
            .unwrap_or(serde_json::Value::Null);

        Self {
            id,
            name,
            arguments,
        }
    }
}

/// The message half of a generation chunk.
///
/// Only `tool_calls` is interpreted. `content` is kept as raw JSON since
/// vendors send either a string or a list of content blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    /// `None` when the message carried no tool-call list, or something other
    /// than a list under that key.
    #[serde(
        default,
        deserialize_with = "deserialize_tool_calls",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_calls: Option<Vec<ToolCallEntry>>,
}

fn deserialize_tool_calls<'de, D>(deserializer: D) -> Result<Option<Vec<ToolCallEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(items)) => {
            Ok(Some(items.into_iter().map(ToolCallEntry::from).collect()))
        }
        _ => Ok(None),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(text)) => Ok(text),
        _ => Ok(String::new()),
    }
}

// A `null` or non-object message reads as an empty one so the chunk still
// counts as a step without tool calls.
fn deserialize_message<'de, D>(deserializer: D) -> Result<ChunkMessage, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(value @ serde_json::Value::Object(_)) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(ChunkMessage::default()),
    }
}

/// One incremental unit of a model response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationChunk {
    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "String::is_empty"
    )]
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_message")]
    pub message: ChunkMessage,
}

impl GenerationChunk {
    /// Build a chunk whose message carries the given tool calls.
    #[must_use]
    pub fn with_tool_calls(tool_calls: Vec<ToolCallEntry>) -> Self {
        Self {
            text: String::new(),
            message: ChunkMessage {
                content: None,
                tool_calls: Some(tool_calls),
            },
        }
    }

    /// Tool-call entries carried by this chunk, empty when there are none.
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCallEntry] {
        self.message.tool_calls.as_deref().unwrap_or_default()
    }
}

/// A tool call accepted by the streaming parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolCallCandidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCallCandidate {
    /// The candidate's id mapped onto the nine-character vendor grammar.
    #[must_use]
    pub fn normalized_id(&self) -> Option<NormalizedId> {
        self.id.as_deref().map(normalize)
    }
}

impl From<&ToolCallEntry> for ToolCallCandidate {
    fn from(entry: &ToolCallEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            arguments: entry.arguments.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_entry_with_args_alias() {
        let entry: ToolCallEntry =
            serde_json::from_value(json!({"name": "get_weather", "args": {"city": "SF"}, "id": "c1"}))
                .unwrap();
        assert_eq!(entry.name, "get_weather");
        assert_eq!(entry.arguments, json!({"city": "SF"}));
        assert_eq!(entry.id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_openai_wire_entry() {
        let entry: ToolCallEntry = serde_json::from_value(json!({
            "id": "call_abc123",
            "type": "function",
            "function": {"name": "lookup", "arguments": "{\"q\":\"rust\"}"}
        }))
        .unwrap();
        assert_eq!(entry.name, "lookup");
        assert_eq!(entry.arguments, json!("{\"q\":\"rust\"}"));
    }

    #[test]
    fn test_entry_missing_pieces_are_filled() {
        let entry: ToolCallEntry = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(entry.name, "");
        assert_eq!(entry.id, None);
        assert!(entry.arguments.is_null());

        let entry: ToolCallEntry = serde_json::from_value(json!("garbage")).unwrap();
        assert_eq!(entry.name, "");
    }

    #[test]
    fn test_non_array_tool_calls_reads_as_none() {
        let chunk: GenerationChunk =
            serde_json::from_value(json!({"message": {"tool_calls": "oops"}})).unwrap();
        assert!(chunk.message.tool_calls.is_none());
        assert!(chunk.tool_calls().is_empty());

        let chunk: GenerationChunk =
            serde_json::from_value(json!({"message": {"tool_calls": null}})).unwrap();
        assert!(chunk.message.tool_calls.is_none());

        let chunk: GenerationChunk = serde_json::from_value(json!({"text": "hi"})).unwrap();
        assert_eq!(chunk.text, "hi");
        assert!(chunk.tool_calls().is_empty());
    }

    #[test]
    fn test_chunk_with_tool_calls() {
        let chunk: GenerationChunk = serde_json::from_value(json!({
            "message": {
                "content": "",
                "tool_calls": [
                    {"name": "a", "args": {"x": 1}},
                    {"name": "b", "args": {"y": 2}}
                ]
            }
        }))
        .unwrap();
        let names: Vec<&str> = chunk.tool_calls().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_content_blocks_keep_tool_calls() {
        let chunk: GenerationChunk = serde_json::from_value(json!({
            "message": {
                "content": [{"type": "text", "text": "calling"}],
                "tool_calls": [{"id": "c1", "name": "get_weather", "args": {"city": "Paris"}}]
            }
        }))
        .unwrap();
        assert_eq!(chunk.tool_calls().len(), 1);
        assert_eq!(chunk.tool_calls()[0].arguments, json!({"city": "Paris"}));
        assert_eq!(
            chunk.message.content,
            Some(json!([{"type": "text", "text": "calling"}]))
        );
    }

    #[test]
    fn test_null_message_and_text_read_as_empty() {
        let chunk: GenerationChunk =
            serde_json::from_value(json!({"message": null, "text": null})).unwrap();
        assert_eq!(chunk, GenerationChunk::default());

        let chunk: GenerationChunk =
            serde_json::from_str(r#"{"message": "oops", "text": 3}"#).unwrap();
        assert!(chunk.tool_calls().is_empty());
        assert!(chunk.text.is_empty());
    }

    #[test]
    fn test_candidate_normalized_id() {
        let candidate = ToolCallCandidate {
            id: Some("tool-call-id-123".to_string()),
            name: String::new(),
            arguments: json!({}),
        };
        assert_eq!(candidate.normalized_id().unwrap().as_str(), "0001MXIBU");
        assert_eq!(ToolCallCandidate::default().normalized_id(), None);
    }
}

// Streaming tool-call parser.
//
// Consumes generation chunks one at a time and always answers with exactly one
// arguments value, even when a chunk carries no usable tool call. The parser is
// a two-state machine held per stream:
//
// - Empty: nothing accepted yet; a chunk without tool calls yields `{}`.
// - HasLatest: the last accepted candidate; a chunk without tool calls
//   re-emits its arguments so transient gaps in the stream are masked.
//
// Key invariants:
// - Only the first tool call of a step is surfaced; the rest are ignored.
// - An accepted candidate has its name blanked before it is stored.
// - Arguments are passed through untouched; schema checks belong to the caller.

use serde_json::Value;

use crate::protocol::canonical::{GenerationChunk, ToolCallCandidate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Recovery state of one stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParserState {
    /// No candidate accepted yet.
    #[default]
    Empty,
    /// Holds the most recently accepted candidate.
    HasLatest(ToolCallCandidate),
}

/// Per-stream partial tool-call parser.
///
/// Not shareable between concurrent streams: one driver feeds chunks in the
/// order they were produced. Dropping the parser mid-stream has no side
/// effects.
#[derive(Debug, Default)]
pub struct StreamingToolCallParser {
    state: ParserState,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

impl StreamingToolCallParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously captured state.
    #[must_use]
    pub fn with_state(state: ParserState) -> Self {
        Self { state }
    }

    #[must_use]
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// The last accepted candidate, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&ToolCallCandidate> {
        match &self.state {
            ParserState::Empty => None,
            ParserState::HasLatest(candidate) => Some(candidate),
        }
    }

    /// Process one generation chunk and return the arguments to surface.
    pub fn process_chunk(&mut self, chunk: &GenerationChunk) -> Value {
        self.process_generations(std::slice::from_ref(chunk))
    }

    /// Process several generations as a single step.
    ///
    /// Tool calls are flattened across all generations in order; only the
    /// first one is considered.
    pub fn process_generations(&mut self, chunks: &[GenerationChunk]) -> Value {
        let first = chunks
            .iter()
            .flat_map(GenerationChunk::tool_calls)
            .next();

        let Some(entry) = first else {
            return self.recover();
        };

        let mut candidate = ToolCallCandidate::from(entry);
        // Name resolution happens downstream; only the arguments are surfaced.
        candidate.name.clear();
        let arguments = candidate.arguments.clone();
        self.state = ParserState::HasLatest(candidate);
        arguments
    }

    /// Forget any accepted candidate.
    pub fn reset(&mut self) {
        self.state = ParserState::Empty;
    }

    #[must_use]
    pub fn into_state(self) -> ParserState {
        self.state
    }

    fn recover(&self) -> Value {
        match &self.state {
            ParserState::HasLatest(candidate) => {
                tracing::debug!("chunk carried no tool call; repeating last accepted arguments");
                candidate.arguments.clone()
            }
            ParserState::Empty => {
                tracing::debug!("chunk carried no tool call and none accepted yet; emitting placeholder");
                Value::Object(serde_json::Map::new())
            }
        }
    }
}

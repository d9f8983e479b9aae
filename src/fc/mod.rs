pub mod output;
pub mod retry;
pub mod schema;
pub mod stream;
pub mod tool_id;
pub mod validator;

pub use output::{ParsedToolCall, ToolsOutputParser};
pub use retry::{correct_arguments, RetryContext};
pub use schema::{compile, SchemaKind, SchemaNode, UnsupportedSchemaError};
pub use stream::{ParserState, StreamingToolCallParser};
pub use tool_id::{is_valid_tool_call_id, normalize, NormalizedId};
pub use validator::{validate, ValidationError, ValidationErrorKind};

//! Vendor API schema detection and text location.
//!
//! # Supported schemas
//!
//! | Schema      | URL markers                                               | Request text                   | Response text                        |
//! |-------------|-----------------------------------------------------------|--------------------------------|--------------------------------------|
//! | `openai`    | `api.openai.com` + `/v1/chat/completions`, `/v1/completions` | last user message, `prompt` | `choices[0].message.content`, `.text` |
//! | `anthropic` | `anthropic.com` + `/v1/messages`, `/v1/complete`          | last user message, `prompt`    | `content`, `completion`              |
//! | `gemini`    | `generativelanguage.googleapis.com` + `/v1/models` + `/generateContent` | first `parts[*].text` | `candidates[0].content.parts[*].text` |
//!
//! # Usage
//!
//! ```rust,ignore
//! use stego::schema::{locate_request_text, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new();
//! let schema = registry.detect("https://api.openai.com/v1/chat/completions").unwrap();
//!
//! let mut doc: serde_json::Value = serde_json::from_str(body)?;
//! let found = locate_request_text(schema, &doc).unwrap();
//! found.path.set(&mut doc, "WF:")?;
//! ```

mod locator;
mod path;
mod registry;

pub use locator::{locate_request_text, locate_response_text, LocatedText};
pub use path::{FieldPath, PathStep};
pub use registry::{
    RequestText, ResponseText, SchemaDescriptor, SchemaId, SchemaRegistry, UrlMatcher,
    BUILTIN_SCHEMAS,
};

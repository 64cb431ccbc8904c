//! Locate the single semantic text field of a request or response.

use serde::Serialize;
use serde_json::Value;

use super::path::FieldPath;
use super::registry::{RequestText, ResponseText, SchemaDescriptor, SchemaId};

/// Text found in a document together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedText {
    /// The string value at `path`
    pub text: String,
    /// Path of the string leaf
    pub path: FieldPath,
}

impl LocatedText {
    fn new(text: &str, path: FieldPath) -> Self {
        Self {
            text: text.to_string(),
            path,
        }
    }
}

/// Find the human-authored prompt text of a request.
pub fn locate_request_text(schema: SchemaId, doc: &Value) -> Option<LocatedText> {
    match SchemaDescriptor::builtin(schema).request_text {
        RequestText::ChatMessages => locate_chat_prompt(doc),
        RequestText::Contents => locate_contents_prompt(doc),
    }
}

/// Find the generated text of a response.
pub fn locate_response_text(schema: SchemaId, doc: &Value) -> Option<LocatedText> {
    match SchemaDescriptor::builtin(schema).response_text {
        ResponseText::Choices => locate_choices_text(doc),
        ResponseText::Content => locate_content_text(doc),
        ResponseText::Candidates => locate_candidates_text(doc),
    }
}

/// Last `user` message, or `prompt` when there are no messages at all.
fn locate_chat_prompt(doc: &Value) -> Option<LocatedText> {
    let Some(messages) = doc.get("messages") else {
        let prompt = doc.get("prompt")?.as_str()?;
        return Some(LocatedText::new(prompt, FieldPath::root().key("prompt")));
    };

    let (idx, message) = messages
        .as_array()?
        .iter()
        .enumerate()
        .rev()
        .find(|(_, m)| m.get("role").and_then(Value::as_str) == Some("user"))?;

    let base = FieldPath::root().key("messages").index(idx).key("content");
    match message.get("content")? {
        Value::String(text) => Some(LocatedText::new(text, base)),
        Value::Array(blocks) => first_text_block(blocks, base),
        _ => None,
    }
}

fn locate_contents_prompt(doc: &Value) -> Option<LocatedText> {
    let contents = doc.get("contents")?.as_array()?;

    contents.iter().enumerate().find_map(|(i, content)| {
        let parts = content.get("parts")?.as_array()?;
        first_text_block(parts, FieldPath::root().key("contents").index(i).key("parts"))
    })
}

fn locate_choices_text(doc: &Value) -> Option<LocatedText> {
    let choice = doc.get("choices")?.get(0)?;
    let base = FieldPath::root().key("choices").index(0);

    if let Some(text) = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
    {
        return Some(LocatedText::new(text, base.key("message").key("content")));
    }

    let text = choice.get("text")?.as_str()?;
    Some(LocatedText::new(text, base.key("text")))
}

fn locate_content_text(doc: &Value) -> Option<LocatedText> {
    match doc.get("content") {
        Some(Value::String(text)) => {
            return Some(LocatedText::new(text, FieldPath::root().key("content")));
        },
        Some(Value::Array(blocks)) => {
            if let Some(found) = first_text_block(blocks, FieldPath::root().key("content")) {
                return Some(found);
            }
        },
        _ => {},
    }

    let completion = doc.get("completion")?.as_str()?;
    Some(LocatedText::new(completion, FieldPath::root().key("completion")))
}

fn locate_candidates_text(doc: &Value) -> Option<LocatedText> {
    let parts = doc
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    first_text_block(
        parts,
        FieldPath::root()
            .key("candidates")
            .index(0)
            .key("content")
            .key("parts"),
    )
}

/// First element of `blocks` carrying a string `text`.
fn first_text_block(blocks: &[Value], base: FieldPath) -> Option<LocatedText> {
    blocks.iter().enumerate().find_map(|(j, block)| {
        let text = block.get("text")?.as_str()?;
        Some(LocatedText::new(text, base.clone().index(j).key("text")))
    })
}

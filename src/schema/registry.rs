//! Vendor schema registry and URL detection.

use serde::{Deserialize, Serialize};

use crate::config::ApiCompatConfig;

/// Known LLM API schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaId {
    /// OpenAI chat/completions
    OpenAi,
    /// Anthropic messages/complete
    #[serde(alias = "claude")]
    Anthropic,
    /// Google Gemini generateContent
    Gemini,
}

impl SchemaId {
    /// Short name
    pub fn name(&self) -> &'static str {
        match self {
            SchemaId::OpenAi => "openai",
            SchemaId::Anthropic => "anthropic",
            SchemaId::Gemini => "gemini",
        }
    }

    /// All schemas in registration order
    pub fn all() -> &'static [SchemaId] {
        &[SchemaId::OpenAi, SchemaId::Anthropic, SchemaId::Gemini]
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SchemaId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(SchemaId::OpenAi),
            "anthropic" | "claude" => Ok(SchemaId::Anthropic),
            "gemini" | "google" => Ok(SchemaId::Gemini),
            _ => Err(format!("Unknown schema: {s}")),
        }
    }
}

/// Where the prompt text lives in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestText {
    /// Last `user` entry of `messages`, else top-level `prompt`
    ChatMessages,
    /// First `contents[*].parts[*].text`
    Contents,
}

/// Where the generated text lives in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseText {
    /// `choices[0].message.content` or `choices[0].text`
    Choices,
    /// Top-level `content` (string or text blocks), else `completion`
    Content,
    /// `candidates[0].content.parts[*].text`
    Candidates,
}

/// A set of substrings that must all appear in the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlMatcher {
    /// Required substrings (host marker first)
    pub all_of: &'static [&'static str],
}

impl UrlMatcher {
    /// Check a URL
    pub fn matches(&self, url: &str) -> bool {
        self.all_of.iter().all(|marker| url.contains(marker))
    }
}

/// Static description of one vendor schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDescriptor {
    /// Schema identifier
    pub id: SchemaId,
    /// Any matcher identifies the schema
    pub url_matchers: &'static [UrlMatcher],
    /// Request text location
    pub request_text: RequestText,
    /// Response text location
    pub response_text: ResponseText,
}

impl SchemaDescriptor {
    /// Check whether `url` belongs to this schema
    pub fn matches(&self, url: &str) -> bool {
        self.url_matchers.iter().any(|m| m.matches(url))
    }

    /// Built-in descriptor for a schema
    pub fn builtin(id: SchemaId) -> &'static SchemaDescriptor {
        match id {
            SchemaId::OpenAi => &BUILTIN_SCHEMAS[0],
            SchemaId::Anthropic => &BUILTIN_SCHEMAS[1],
            SchemaId::Gemini => &BUILTIN_SCHEMAS[2],
        }
    }
}

/// Built-in schemas in registration order
pub static BUILTIN_SCHEMAS: [SchemaDescriptor; 3] = [
    SchemaDescriptor {
        id: SchemaId::OpenAi,
        url_matchers: &[
            UrlMatcher {
                all_of: &["api.openai.com", "/v1/chat/completions"],
            },
            UrlMatcher {
                all_of: &["api.openai.com", "/v1/completions"],
            },
        ],
        request_text: RequestText::ChatMessages,
        response_text: ResponseText::Choices,
    },
    SchemaDescriptor {
        id: SchemaId::Anthropic,
        url_matchers: &[
            UrlMatcher {
                all_of: &["anthropic.com", "/v1/messages"],
            },
            UrlMatcher {
                all_of: &["anthropic.com", "/v1/complete"],
            },
        ],
        request_text: RequestText::ChatMessages,
        response_text: ResponseText::Content,
    },
    SchemaDescriptor {
        id: SchemaId::Gemini,
        url_matchers: &[UrlMatcher {
            all_of: &["generativelanguage.googleapis.com", "/v1/models", "/generateContent"],
        }],
        request_text: RequestText::Contents,
        response_text: ResponseText::Candidates,
    },
];

/// Ordered registry of schemas used for detection.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    descriptors: Vec<&'static SchemaDescriptor>,
    enabled: bool,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self {
            descriptors: BUILTIN_SCHEMAS.iter().collect(),
            enabled: true,
        }
    }
}

impl SchemaRegistry {
    /// Registry with every built-in schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry restricted to the configured schemas
    pub fn from_config(config: &ApiCompatConfig) -> Self {
        let descriptors = BUILTIN_SCHEMAS
            .iter()
            .filter(|d| config.supported_apis.contains(&d.id))
            .collect();

        Self {
            descriptors,
            enabled: config.enabled,
        }
    }

    /// Turn detection off entirely
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Detect the schema a URL belongs to.
    ///
    /// First registered match wins. Purely syntactic.
    pub fn detect(&self, url: &str) -> Option<SchemaId> {
        if !self.enabled {
            return None;
        }
        self.descriptors
            .iter()
            .find(|d| d.matches(url))
            .map(|d| d.id)
    }

    /// Descriptor for a detected schema
    pub fn descriptor(&self, id: SchemaId) -> Option<&'static SchemaDescriptor> {
        self.descriptors.iter().copied().find(|d| d.id == id)
    }

    /// Registered schema ids in order
    pub fn schemas(&self) -> Vec<SchemaId> {
        self.descriptors.iter().map(|d| d.id).collect()
    }

    /// Whether detection is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

//! Built-in substitution table.
//!
//! Phrase → token rules for common programming and prompt vocabulary.
//! Order here is irrelevant: the table is sorted by descending pattern
//! length when compiled into a [`DictionaryTable`](super::DictionaryTable).

use phf::phf_map;

/// Built-in rules (pattern → token)
pub static BUILTIN_RULES: phf::Map<&'static str, &'static str> = phf_map! {
    // Programming instructions
    "Write a function" => "WF:",
    "Implement a function" => "IF:",
    "Create a class" => "CC:",
    "Design a" => "D:",
    "Explain how" => "EH:",
    "What is" => "WI:",
    "How do I" => "HDI:",
    // Programming languages
    "Python" => "PY",
    "JavaScript" => "JS",
    "TypeScript" => "TS",
    "Java" => "JV",
    "C++" => "CPP",
    "C#" => "CS",
    "Go" => "GO",
    "Rust" => "RS",
    // Common concepts
    "algorithm" => "algo",
    "function" => "fn",
    "variable" => "var",
    "class" => "cls",
    "object" => "obj",
    "method" => "mth",
    "interface" => "iface",
    "implementation" => "impl",
    "database" => "db",
    "asynchronous" => "async",
    "synchronous" => "sync",
    "framework" => "fwk",
    "library" => "lib",
    "utility" => "util",
    "directory" => "dir",
    "repository" => "repo",
    "configuration" => "cfg",
    "development" => "dev",
    "production" => "prod",
    "environment" => "env",
    "application" => "app",
    "optimization" => "opt",
    "performance" => "perf",
    "documentation" => "docs",
    "attribute" => "attr",
    "parameter" => "param",
    "argument" => "arg",
    // Prompt verbs
    "Summarize" => "SUM:",
    "Translate" => "TR:",
    "Compare" => "CMP:",
    "Analyze" => "ANL:",
    "Critique" => "CRT:",
    "Evaluate" => "EVAL:",
    "Generate" => "GEN:",
};

//! rulemark - validation and auto-correction for structured rule documents.
//!
//! Rule documents are Markdown files (or plain YAML) whose payload is a YAML
//! mapping with a `$meta` header, cross-references written as `*dotted.paths`
//! and optional `$refs` to other documents. The engine reports every problem
//! it finds and repairs what can be repaired safely.
//!
//! # Example
//!
//! ```no_run
//! use rulemark::{Engine, EngineConfig};
//! use std::path::Path;
//!
//! let engine = Engine::new(EngineConfig::default());
//! let result = engine.validate_path(Path::new(".cursor/rules/style.mdc"));
//!
//! for diagnostic in &result.diagnostics {
//!     println!("{}: {}", diagnostic.code, diagnostic.message);
//! }
//! if let Some(text) = &result.corrected_text {
//!     std::fs::write(".cursor/rules/style.mdc", text).unwrap();
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod error_formatting;
pub mod extract;
pub mod loader;
pub mod output;
pub mod server;
pub mod validation;

pub use cache::ExternalCache;
pub use config::{AliasPolicy, EngineConfig};
pub use document::Document;
pub use engine::{Engine, ValidationResult};
pub use error::{Result, RulemarkError};
pub use loader::{DocumentLoader, FsLoader, LoadError, MemoryLoader};
pub use validation::{Diagnostic, DiagnosticCode, Severity};

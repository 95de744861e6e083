//! 结构化输出模块：从模型自由文本中提取 JSON，并把枚举字段收敛到已知取值。
//!
//! # Structured Output Module
//!
//! Turns free-form model text into typed items:
//!
//! 1. [`extract_json_candidate`] strips a Markdown code fence if present.
//! 2. The candidate is parsed as JSON. A syntax error is [`Error::MalformedResponse`](crate::Error),
//!    which the failover loop treats as a provider failure.
//! 3. Each declared enum field is coerced against its [`ItemSchema`]: anything outside the
//!    allowed set (or missing) becomes the documented default, e.g. an issue severity of
//!    `"catastrophic"` becomes `"warning"`.
//!
//! ```rust
//! use quill_ai::structured::{parse_items, schema::ISSUE};
//!
//! let raw = "```json\n{\"issues\": [{\"severity\": \"catastrophic\", \"description\": \"x\"}]}\n```";
//! let items = parse_items(raw, &ISSUE).unwrap();
//! assert_eq!(items[0].str("severity"), "warning");
//! ```

pub mod extract;
pub mod parser;
pub mod schema;

pub use extract::extract_json_candidate;
pub use parser::{parse_items, parse_object, StructuredItem};
pub use schema::{FieldKind, FieldSpec, ItemSchema};

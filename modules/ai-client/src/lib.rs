pub mod error;
pub mod gemini;
pub mod parse;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use gemini::Gemini;
pub use parse::{parse_json, Delimiter, ParseFailure};
pub use traits::{NotConfigured, TextCompletion, CALL_FAILED_REPLY, NOT_CONFIGURED_REPLY};
pub use util::{strip_code_blocks, truncate_chars};

pub use crate::diagnostics::{ParseResult, Report, ReportKind};
pub use crate::env::Env;
pub use crate::flags::Flags;
pub use crate::parser::parse;

pub mod ast;
pub mod chars;
pub mod cli;
pub mod diagnostics;
pub mod env;
pub mod flags;
pub mod lexer;
pub mod parser;
pub mod source;

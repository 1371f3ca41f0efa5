pub mod config;
pub mod editor;
pub mod eval;
pub mod highlight;
pub mod multiline;
pub mod parser;
pub mod repl;
pub mod signal;
pub mod tokenizer;
pub mod types;

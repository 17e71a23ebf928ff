//! Input handling
//!
//! The only I/O-adjacent concern of the engine: turning a raw text buffer
//! into structured rows. Actual file reading belongs to the caller (the CLI
//! reads the file; library users may obtain the buffer any way they like).

pub mod parser;

pub use parser::{parse, Dialect, ParsedInput, RawRow};

//! Terminal channel layer: expect-style pattern matching and command execution.

mod buffer;
pub mod executor;
pub mod patterns;
mod terminal;

pub use buffer::{BufferMatch, PatternBuffer};
pub use executor::{ExecOptions, Execution, TimeoutPolicy, execute, execute_detailed};
pub use terminal::{Expect, Terminal, TerminalConfig};

/// Interrupt keystroke sent to abandon paginated output.
pub const CTRL_C: &str = "\x03";

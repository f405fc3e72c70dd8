//! Line-oriented admin console for the price board.

mod commands;
mod console;

pub use commands::{parse_command, Command, ParseError};
pub use console::{login, render_items, run, Console, RuntimeReader};

pub mod commands;

pub use commands::{parse_command, CommandHandler, ListCategory, PlaylistCommand, Reply};

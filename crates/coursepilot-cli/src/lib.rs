// Library interface for coursepilot-cli, used by the integration tests.
// commands.rs and render.rs are also declared in main.rs, so the path
// attribute points both crates at the same source file.

#[path = "commands.rs"]
pub mod commands;

#[path = "render.rs"]
pub mod render;

pub use commands::{handle_command, CommandResult};

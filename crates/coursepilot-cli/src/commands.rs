/// Result of processing a line typed into the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the shell.
    Quit,
    /// Start a fresh conversation.
    NewChat,
    /// Reload and show the chat list.
    ListChats,
    /// Switch to a chat by id.
    OpenChat(String),
    /// Delete a chat by id.
    DeleteChat(String),
    /// Generate a study plan; `true` skips the cached one.
    Plan(bool),
    /// Show session status (active chat, token budget).
    ShowStatus,
    /// Not a command - send as a chat message.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/new" => CommandResult::NewChat,
        "/chats" | "/ls" => CommandResult::ListChats,
        "/open" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /open <chat-id>".into())
            } else {
                CommandResult::OpenChat(arg.to_string())
            }
        }
        "/delete" | "/rm" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /delete <chat-id>".into())
            } else {
                CommandResult::DeleteChat(arg.to_string())
            }
        }
        "/plan" => match arg {
            "" => CommandResult::Plan(false),
            "force" | "--force" => CommandResult::Plan(true),
            _ => CommandResult::Message("Usage: /plan [force]".into()),
        },
        "/status" => CommandResult::ShowStatus,
        "/version" => CommandResult::Message(format!("CoursePilot CLI v{}", env!("CARGO_PKG_VERSION"))),

        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
CoursePilot commands

  CHATS
    /new                 Start a fresh conversation
    /chats, /ls          List your chats
    /open <id>           Switch to a chat and reload its messages
    /delete <id>, /rm    Delete a chat

  PLANNER
    /plan [force]        Generate a study plan (force skips the cached one)

  OTHER
    /status              Show the active chat and token budget
    /help, /h            Show this help message
    /version             Show version information
    /quit, /exit, /q     Quit

Anything else is sent to the assistant.";

    CommandResult::Message(help_text.into())
}

use anyhow::Result;
use coursepilot_core::{estimate_tokens, ChatSession, PilotError, Planner, Settings};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::commands::{handle_command, CommandResult};
use crate::render;

fn build_session(settings: &Settings) -> Result<ChatSession> {
    let api = settings.build_api_client()?;
    Ok(ChatSession::new(api, settings.context_window()))
}

/// Log the full error, hand the user the friendly version.
fn friendly(e: PilotError) -> anyhow::Error {
    tracing::debug!(kind = e.kind(), error = %e, "request failed");
    anyhow::anyhow!(e.user_message())
}

async fn flush_toasts(session: &ChatSession) {
    if let Some(text) = render::format_toasts(&session.take_toasts().await) {
        eprintln!("{text}");
    }
}

pub async fn run_single_prompt(settings: &Settings, prompt: &str, chat_id: Option<&str>) -> Result<()> {
    let session = build_session(settings)?;
    if let Some(id) = chat_id {
        session.select_chat(id).await.map_err(friendly)?;
    }

    let reply = session.send_message(prompt).await.map_err(friendly)?;
    println!("{}", reply.content);
    if let Some(id) = reply.chat_id {
        eprintln!("[chat {id}]");
    }
    Ok(())
}

pub async fn list_chats(settings: &Settings) -> Result<()> {
    let session = build_session(settings)?;
    let chats = session.refresh_chats().await.map_err(friendly)?;
    println!("{}", render::format_chat_list(&chats));
    Ok(())
}

pub async fn delete_chat(settings: &Settings, chat_id: &str) -> Result<()> {
    let session = build_session(settings)?;
    session.refresh_chats().await.map_err(friendly)?;

    match session.delete_chat(chat_id).await {
        Ok(()) => {
            println!("Deleted chat {chat_id}.");
            Ok(())
        }
        Err(e) => {
            flush_toasts(&session).await;
            Err(friendly(e))
        }
    }
}

pub async fn generate_plan(settings: &Settings, force: bool) -> Result<()> {
    let planner = settings.build_planner()?;
    eprintln!("Generating your study plan. This can take a minute...");
    let plan = planner
        .generate(force, &CancellationToken::new())
        .await
        .map_err(friendly)?;
    println!("{}", render::format_plan(&plan));
    Ok(())
}

pub fn print_tokens(settings: &Settings, text: &str) {
    let window = settings.context_window();
    println!(
        "{} tokens ({} characters)",
        estimate_tokens(text),
        text.chars().count()
    );
    println!(
        "Budget: {} input tokens, {} per request",
        window.available_input_tokens(),
        window.selection_cap()
    );
}

/// Interactive line shell. Plain lines go to the assistant, slash commands
/// are handled locally.
pub async fn run_shell(settings: &Settings) -> Result<()> {
    let session = build_session(settings)?;
    let planner = settings.build_planner()?;

    println!(
        "CoursePilot v{} - type /help for commands, /quit to leave.",
        env!("CARGO_PKG_VERSION")
    );
    if let Err(e) = session.refresh_chats().await {
        eprintln!("Could not load your chats: {}", e.user_message());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match handle_command(&line) {
            CommandResult::Message(text) => println!("{text}"),
            CommandResult::Quit => break,
            CommandResult::NewChat => {
                session.new_chat().await;
                println!("Started a new chat.");
            }
            CommandResult::ListChats => match session.refresh_chats().await {
                Ok(chats) => println!("{}", render::format_chat_list(&chats)),
                Err(e) => eprintln!("error: {}", e.user_message()),
            },
            CommandResult::OpenChat(id) => match session.select_chat(&id).await {
                Ok(messages) if messages.is_empty() => println!("Chat {id} has no messages yet."),
                Ok(messages) => println!("{}", render::format_transcript(&messages)),
                Err(e) => eprintln!("error: {}", e.user_message()),
            },
            CommandResult::DeleteChat(id) => match session.delete_chat(&id).await {
                Ok(()) => println!("Deleted chat {id}."),
                Err(PilotError::Invalid(reason)) => eprintln!("error: {reason}"),
                // the rollback toast is shown below
                Err(e) => tracing::debug!(chat_id = %id, error = %e, "delete failed"),
            },
            CommandResult::Plan(force) => run_plan(&planner, force).await,
            CommandResult::ShowStatus => {
                let active = session.active().await;
                let messages = session.active_messages().await;
                println!("{}", render::format_status(&active, &messages, session.window()));
            }
            CommandResult::NotACommand => send(&session, line).await,
        }

        flush_toasts(&session).await;
    }

    Ok(())
}

/// Send on a separate task so Ctrl-C only stops the wait; the reply still
/// lands in the chat it was sent from.
async fn send(session: &ChatSession, text: String) {
    let task = tokio::spawn({
        let session = session.clone();
        async move { session.send_message(&text).await }
    });

    tokio::select! {
        joined = task => match joined {
            Ok(Ok(reply)) => println!("\n{}\n", render::format_message(&reply)),
            Ok(Err(e)) => eprintln!("error: {}", e.user_message()),
            Err(e) => eprintln!("error: send task failed: {e}"),
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nStopped waiting. The reply will still be saved to its chat.");
        }
    }
}

/// Ctrl-C cancels generation, including any retry still pending.
async fn run_plan(planner: &Planner, force: bool) {
    eprintln!("Generating your study plan. This can take a minute... (Ctrl-C to cancel)");
    let cancel = CancellationToken::new();
    let generate = planner.generate(force, &cancel);
    tokio::pin!(generate);

    let result = tokio::select! {
        result = &mut generate => result,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            generate.await
        }
    };
    match result {
        Ok(plan) => println!("{}", render::format_plan(&plan)),
        Err(PilotError::Cancelled) => eprintln!("Plan generation cancelled."),
        Err(e) => eprintln!("error: {}", e.user_message()),
    }
}

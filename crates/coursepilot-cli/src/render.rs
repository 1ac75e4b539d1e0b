use coursepilot_core::api::planner::{AiPlan, DeadlinePriority, InsightKind, TodoPriority};
use coursepilot_core::context::estimate_messages;
use coursepilot_core::{ChatListItem, ContextWindow, Message, Role, SessionKey, Toast};

pub fn format_chat_list(items: &[ChatListItem]) -> String {
    if items.is_empty() {
        return "No chats yet. Type a message to start one.".to_string();
    }

    let mut out = String::new();
    for item in items {
        out.push_str(&format!(
            "  {}  {}  {}\n",
            item.chat_id,
            item.updated_at.format("%Y-%m-%d %H:%M"),
            item.title
        ));
        if let Some(last) = item.last_message.as_deref().filter(|m| !m.is_empty()) {
            out.push_str(&format!("      {last}\n"));
        }
    }
    out.trim_end().to_string()
}

pub fn format_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::System => "system",
    };
    format!("{who}: {}", message.content)
}

pub fn format_transcript(messages: &[Message]) -> String {
    messages.iter().map(format_message).collect::<Vec<_>>().join("\n\n")
}

pub fn format_toasts(toasts: &[Toast]) -> Option<String> {
    if toasts.is_empty() {
        return None;
    }
    Some(toasts.iter().map(|t| format!("! {}", t.message)).collect::<Vec<_>>().join("\n"))
}

pub fn format_status(active: &SessionKey, messages: &[Message], window: &ContextWindow) -> String {
    let chat = match active {
        SessionKey::Chat(id) => id.clone(),
        SessionKey::Draft(_) => "(new chat)".to_string(),
    };
    let outbound = window.select_context(messages);
    format!(
        "Chat:      {chat}\n\
         Messages:  {} ({} tokens)\n\
         Context:   {} messages ({} tokens) go out with the next request\n\
         Budget:    {} input tokens, {} per request",
        messages.len(),
        estimate_messages(messages),
        outbound.len(),
        estimate_messages(outbound),
        window.available_input_tokens(),
        window.selection_cap(),
    )
}

pub fn format_plan(plan: &AiPlan) -> String {
    let mut out = format!(
        "Study plan ({} courses, {} assignments, generated {})\n",
        plan.course_count, plan.assignment_count, plan.generated_at
    );
    out.push_str(&format!(
        "{} tasks, {} high priority, {} upcoming deadlines, ~{} of study\n",
        plan.summary.total_tasks,
        plan.summary.high_priority_count,
        plan.summary.upcoming_deadlines,
        plan.summary.estimated_study_time
    ));

    if !plan.todos.is_empty() {
        out.push_str("\nTODO\n");
        for todo in &plan.todos {
            let mark = match todo.priority {
                TodoPriority::High => "!!",
                TodoPriority::Medium => "! ",
                TodoPriority::Low => "  ",
            };
            let done = if todo.completed { "x" } else { " " };
            out.push_str(&format!("  [{done}] {mark} {}", todo.title));
            if let Some(due) = &todo.due_date {
                out.push_str(&format!(" (due {due})"));
            }
            out.push('\n');
        }
    }

    if !plan.deadlines.is_empty() {
        out.push_str("\nDEADLINES\n");
        for deadline in &plan.deadlines {
            let tag = match deadline.priority {
                DeadlinePriority::Urgent => "urgent",
                DeadlinePriority::Important => "important",
                DeadlinePriority::Normal => "normal",
            };
            out.push_str(&format!(
                "  {}  {} - {} [{tag}]\n",
                deadline.due_date, deadline.course, deadline.title
            ));
        }
    }

    if !plan.study_blocks.is_empty() {
        out.push_str("\nSTUDY BLOCKS\n");
        for block in &plan.study_blocks {
            out.push_str(&format!("  {} ({}, {})\n", block.title, block.course, block.duration));
        }
    }

    if !plan.insights.is_empty() {
        out.push_str("\nINSIGHTS\n");
        for insight in &plan.insights {
            let icon = match insight.kind {
                InsightKind::Tip => "tip",
                InsightKind::Warning => "warn",
                InsightKind::Success => "ok",
                InsightKind::Info => "info",
            };
            out.push_str(&format!("  [{icon}] {}: {}\n", insight.title, insight.message));
        }
    }

    out.trim_end().to_string()
}

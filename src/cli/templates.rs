//! Note templates for the `conversation`, `context` and `prompt` commands
//!
//! Rendering is pure: callers pass the timestamp so output is reproducible.

use chrono::NaiveDateTime;

use crate::core::vault::{CONTEXTS_DIR, CONVERSATIONS_DIR, PROMPTS_DIR};

/// A rendered note ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub path: String,
    pub content: String,
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn tag(s: &str) -> String {
    s.trim().to_lowercase().replace(char::is_whitespace, "_")
}

/// Conversation log at `AI/Memory/Conversations/<agent>/<YYYYMMDD>-<HHMM>-<topic>.md`
pub fn conversation(
    agent: &str,
    topic: &str,
    content: Option<&str>,
    project: Option<&str>,
    now: NaiveDateTime,
) -> Rendered {
    let path = format!(
        "{}/{}/{}-{}.md",
        CONVERSATIONS_DIR,
        agent,
        now.format("%Y%m%d-%H%M"),
        topic
    );
    let title = format!("{} Conversation: {}", agent, topic);

    let mut out = String::from("---\n");
    out.push_str(&format!("title: {}\n", quote(&title)));
    out.push_str(&format!("agent: {}\n", quote(agent)));
    out.push_str(&format!("date: {}\n", quote(&now.format("%Y-%m-%d %H:%M").to_string())));
    if let Some(project) = project {
        out.push_str(&format!("project: {}\n", quote(project)));
    }
    out.push_str(&format!("tags: [conversation, {}]\n", tag(topic)));
    out.push_str("---\n\n");
    out.push_str(&format!("# {}\n\n", title));
    out.push_str(&format!("## Context\n- Initial conversation about {}\n\n", topic));
    out.push_str(&format!(
        "## Conversation\n{}\n\n",
        content.unwrap_or("- Key points and insights will be added here")
    ));
    out.push_str("## Actions\n- Follow-up items to be determined\n\n");
    out.push_str("## Memory Extraction\n- New contexts to be identified\n");

    Rendered { path, content: out }
}

/// Context note at `AI/Memory/Contexts/<category>/<name>.md`
pub fn context(category: &str, name: &str, content: Option<&str>, now: NaiveDateTime) -> Rendered {
    let path = format!("{}/{}/{}.md", CONTEXTS_DIR, category, name);

    let mut out = front_matter(name, category, "context", now);
    out.push_str(&format!("# {}\n\n", name));
    out.push_str(&format!("## Overview\n{}\n\n", content.unwrap_or("Brief description")));
    out.push_str("## Key Information\n- Important fact 1\n- Important fact 2\n\n");
    out.push_str("## Related Contexts\n- Add related contexts here\n\n");
    out.push_str("## Source Conversations\n- Add source conversations here\n");

    Rendered { path, content: out }
}

/// System prompt at `AI/Memory/System_Prompts/<category>/<name>.md`
pub fn prompt(category: &str, name: &str, content: Option<&str>, now: NaiveDateTime) -> Rendered {
    let path = format!("{}/{}/{}.md", PROMPTS_DIR, category, name);

    let mut out = front_matter(name, category, "system_prompt", now);
    out.push_str(&format!("# {}\n\n", name));
    out.push_str(content.unwrap_or(
        "Detailed system prompt instructions that can be applied by AI assistants.",
    ));
    out.push('\n');

    Rendered { path, content: out }
}

fn front_matter(name: &str, category: &str, kind: &str, now: NaiveDateTime) -> String {
    format!(
        "---\ntitle: {}\nagent: {}\ndate: {}\ntags: [{}, {}]\nstatus: \"active\"\n---\n\n",
        quote(name),
        quote(category),
        quote(&now.format("%Y-%m-%d %H:%M").to_string()),
        kind,
        tag(name)
    )
}

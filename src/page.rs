use chrono::Local;
use std::fmt::Write;

use crate::render::{escape_html, pretty, render_response};
use crate::session::{Interaction, Notice, NoticeLevel, SessionContext};

/// Interactions shown in the main panel.
pub const RECENT_INTERACTIONS: usize = 5;
/// History entries shown in the sidebar.
pub const SIDEBAR_HISTORY: usize = 10;
const HISTORY_PREVIEW_CHARS: usize = 40;

const OCEAN_THEME: &str = r#"
:root {
  --primary: #1E3A8A;
  --secondary: #F59E0B;
  --success: #059669;
  --error: #DC2626;
  --bg: #F3F4F6;
  --surface: #FFFFFF;
  --text: #111827;
  --muted: #6B7280;
  --border: #E5E7EB;
}
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, -apple-system, sans-serif; background: var(--bg); color: var(--text); }
.layout { display: grid; grid-template-columns: 300px 1fr; min-height: 100vh; }
.sidebar { background: var(--surface); border-right: 1px solid var(--border); padding: 20px; }
.main { padding: 2rem; max-width: 1100px; }
.caption { color: var(--muted); font-size: 0.9rem; }
.ocean-card { background: var(--surface); border: 1px solid var(--border); border-radius: 12px; padding: 16px 18px; box-shadow: 0 4px 14px rgba(30, 58, 138, 0.06); margin: 8px 0; white-space: pre-wrap; }
.ocean-header { font-weight: 700; margin: 0 0 8px 0; }
.ocean-divider { height: 1px; background: var(--border); margin: 8px 0 14px 0; }
.ocean-badge { display: inline-block; padding: 2px 10px; border-radius: 999px; background: rgba(30, 58, 138, 0.08); color: var(--primary); font-weight: 600; font-size: 12px; border: 1px solid rgba(30, 58, 138, 0.15); }
.notice { padding: 10px 14px; border-radius: 8px; margin: 8px 0; }
.notice.info { background: #DBEAFE; color: var(--primary); }
.notice.success { background: #D1FAE5; color: var(--success); }
.notice.warning { background: #FEF3C7; color: #92400E; }
.notice.error { background: #FEE2E2; color: var(--error); }
.query-form { display: grid; grid-template-columns: 3fr 1fr; gap: 16px; }
textarea { width: 100%; height: 150px; padding: 10px; border: 1px solid var(--border); border-radius: 8px; font: inherit; }
button { padding: 8px 14px; border-radius: 8px; border: 1px solid var(--border); background: var(--surface); cursor: pointer; font: inherit; }
button.primary { background: var(--primary); color: #fff; border-color: var(--primary); width: 100%; }
select { width: 100%; padding: 6px; margin: 6px 0; }
pre { white-space: pre-wrap; word-break: break-word; background: #F9FAFB; padding: 8px; border-radius: 6px; }
.item-label { margin-top: 10px; }
.sidebar ul { padding-left: 18px; }
footer { margin-top: 32px; border-top: 1px solid var(--border); padding-top: 8px; }
"#;

/// Render the whole console page, consuming pending notices and outcome.
pub fn render_page(ctx: &mut SessionContext, base_url: &str) -> String {
    let notices = ctx.take_notices();
    let outcome = ctx.take_outcome().map(render_outcome);

    let mut html = String::new();
    html.push_str("<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    html.push_str("<title>Agent Query UI</title><style>");
    html.push_str(OCEAN_THEME);
    html.push_str("</style></head><body><div class=\"layout\">");
    html.push_str(&sidebar(ctx, base_url));
    html.push_str(&main_panel(ctx, &notices, outcome.as_deref()));
    html.push_str("</div></body></html>");
    html
}

fn notice(level: NoticeLevel, text: &str) -> String {
    format!(
        r#"<div class="notice {}">{}</div>"#,
        level.css_class(),
        escape_html(text)
    )
}

fn sidebar(ctx: &SessionContext, base_url: &str) -> String {
    let mut out = String::from(r#"<aside class="sidebar">"#);
    out.push_str("<h3>Agent Query Console</h3>");
    out.push_str(r#"<div class="caption">Ocean Professional &bull; Classic layout</div>"#);
    let _ = write!(out, "<p>Backend: {}</p>", escape_html(base_url));
    out.push_str(r#"<form method="post" action="/refresh"><button type="submit">Refresh API &amp; Agents</button></form>"#);

    if let Some(error) = &ctx.discovery_error {
        out.push_str(&notice(NoticeLevel::Warning, error));
    }

    if ctx.agents.is_empty() {
        out.push_str(&notice(
            NoticeLevel::Info,
            "No agents discovered. You can still try querying the default endpoint.",
        ));
    } else {
        out.push_str(r#"<form method="post" action="/agent"><label for="agent_id">Select Agent</label>"#);
        out.push_str(r#"<select id="agent_id" name="agent_id"><option value="">(None)</option>"#);
        for agent in &ctx.agents {
            let label = escape_html(&agent.label());
            match agent.id() {
                Some(id) => {
                    let selected = if ctx.selected_agent_id.as_deref() == Some(id.as_str()) {
                        " selected"
                    } else {
                        ""
                    };
                    let _ = write!(out, r#"<option value="{}"{}>{}</option>"#, escape_html(&id), selected, label);
                }
                None => {
                    let _ = write!(out, "<option disabled>{}</option>", label);
                }
            }
        }
        out.push_str(r#"</select><button type="submit">Use agent</button></form>"#);
    }

    let _ = write!(
        out,
        "<details><summary>OpenAPI (read-only)</summary><pre>{}</pre></details>",
        escape_html(&pretty(&ctx.api_discovery))
    );

    out.push_str("<hr><h4>History</h4>");
    out.push_str(r#"<form method="post" action="/history"><button type="submit">Load History</button></form>"#);
    let queries = ctx.history_queries();
    if queries.is_empty() {
        out.push_str(r#"<div class="caption">No history loaded yet.</div>"#);
    } else {
        out.push_str("<ul>");
        for query in queries.iter().rev().take(SIDEBAR_HISTORY) {
            let _ = write!(out, "<li>{}</li>", escape_html(&preview(query, HISTORY_PREVIEW_CHARS)));
        }
        out.push_str("</ul>");
    }

    out.push_str(r#"<form method="post" action="/session/end"><button type="submit">End session</button></form>"#);
    out.push_str("</aside>");
    out
}

fn main_panel(ctx: &SessionContext, notices: &[Notice], outcome: Option<&str>) -> String {
    let mut out = String::from(r#"<main class="main">"#);
    out.push_str("<h2>LLM Query</h2>");
    out.push_str(r#"<div class="caption">Submit a prompt to the selected agent and view responses.</div>"#);

    for n in notices {
        out.push_str(&notice(n.level, &n.text));
    }

    let agent = ctx.selected_agent_id.as_deref().unwrap_or("Default");
    let _ = write!(
        out,
        r#"<form method="post" action="/query" class="ocean-card"><div class="query-form"><div><label for="query">Your prompt</label><textarea id="query" name="query" placeholder="Ask a question, provide instructions, or describe a task...">{}</textarea></div><div><span class="ocean-badge">Agent</span><p>{}</p></div></div><button type="submit" class="primary">Submit</button></form>"#,
        escape_html(&ctx.draft_query),
        escape_html(agent)
    );

    if let Some(outcome) = outcome {
        out.push_str(outcome);
    }

    out.push_str("<h3>Recent Interactions</h3>");
    if ctx.interactions().is_empty() {
        out.push_str(&notice(
            NoticeLevel::Info,
            "No interactions yet. Submit a query to see responses here.",
        ));
    } else {
        for interaction in ctx.recent(RECENT_INTERACTIONS) {
            out.push_str(&interaction_card(interaction));
        }
    }

    out.push_str(r#"<footer><div class="caption">Ocean Professional &bull; Agent query console</div></footer>"#);
    out.push_str("</main>");
    out
}

fn render_outcome(interaction: &Interaction) -> String {
    match interaction.error_message() {
        Some(error) => notice(NoticeLevel::Error, &error),
        None => {
            let mut out = notice(
                NoticeLevel::Success,
                &format!("Response received in {:.2}s", interaction.latency.as_secs_f64()),
            );
            out.push_str(&render_response(&interaction.response));
            out
        }
    }
}

fn interaction_card(interaction: &Interaction) -> String {
    let timestamp = interaction
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    format!(
        r#"<div class="ocean-card interaction"><div class="ocean-header">Query</div><div>{}</div><div class="ocean-divider"></div><div class="ocean-header">Response</div>{}<div class="caption">Agent: {} &bull; {} &bull; {:.2}s</div></div>"#,
        escape_html(&interaction.query),
        render_response(&interaction.response),
        escape_html(interaction.agent_id.as_deref().unwrap_or("Default")),
        timestamp,
        interaction.latency.as_secs_f64()
    )
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

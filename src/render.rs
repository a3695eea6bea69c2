use serde_json::Value;
use std::fmt::Write;

/// Keys searched, in order, for the primary text of an object response.
pub const TEXT_KEYS: [&str; 6] = ["answer", "response", "output", "result", "content", "text"];

/// Keys searched, in order, for a list of references.
pub const REFERENCE_KEYS: [&str; 3] = ["references", "citations", "sources"];

/// Display form of a backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Empty,
    Object {
        text: Option<String>,
        references: Vec<Reference>,
        raw: Value,
    },
    Items(Vec<Rendered>),
    Plain(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Link { label: String, url: String },
    Json(String),
    Plain(String),
}

pub fn interpret(value: &Value) -> Rendered {
    match value {
        Value::Null => Rendered::Empty,
        Value::Object(map) => {
            let text = TEXT_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .filter(|text| !text.is_empty())
                .map(str::to_string);

            let references = REFERENCE_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find(|candidate| is_truthy(candidate))
                .and_then(Value::as_array)
                .map(|entries| entries.iter().map(reference).collect())
                .unwrap_or_default();

            Rendered::Object {
                text,
                references,
                raw: value.clone(),
            }
        }
        Value::Array(items) => Rendered::Items(items.iter().map(interpret).collect()),
        other => Rendered::Plain(plain_text(other)),
    }
}

fn reference(entry: &Value) -> Reference {
    let Some(record) = entry.as_object() else {
        return Reference::Plain(plain_text(entry));
    };

    let label = ["title", "id"]
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|v| is_truthy(v))
        .map(plain_text)
        .unwrap_or_else(|| "Source".to_string());

    match record.get("url").filter(|v| is_truthy(v)).map(plain_text) {
        Some(url) if is_linkable(&url) => Reference::Link { label, url },
        _ => Reference::Json(pretty(entry)),
    }
}

fn is_linkable(url: &str) -> bool {
    !url.trim_start().to_ascii_lowercase().starts_with("javascript:")
}

/// Truthiness in the loose sense the backend contract relies on.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

impl Rendered {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Rendered::Empty => {
                out.push_str(r#"<div class="notice warning">Empty response.</div>"#);
            }
            Rendered::Object { text, references, raw } => {
                if let Some(text) = text {
                    let _ = write!(out, r#"<div class="ocean-card response-text">{}</div>"#, escape_html(text));
                }
                if !references.is_empty() {
                    out.push_str(r#"<h5>References</h5><ul class="references">"#);
                    for r in references {
                        match r {
                            Reference::Link { label, url } => {
                                let _ = write!(
                                    out,
                                    r#"<li><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></li>"#,
                                    escape_html(url),
                                    escape_html(label)
                                );
                            }
                            Reference::Json(json) => {
                                let _ = write!(out, "<li><pre>{}</pre></li>", escape_html(json));
                            }
                            Reference::Plain(text) => {
                                let _ = write!(out, "<li>{}</li>", escape_html(text));
                            }
                        }
                    }
                    out.push_str("</ul>");
                }
                let _ = write!(
                    out,
                    r#"<details class="raw-json"><summary>Raw JSON</summary><pre>{}</pre></details>"#,
                    escape_html(&pretty(raw))
                );
            }
            Rendered::Items(items) => {
                for (i, item) in items.iter().enumerate() {
                    let _ = write!(out, r#"<div class="item-label"><strong>Item {}</strong></div>"#, i + 1);
                    item.write_html(out);
                }
            }
            Rendered::Plain(text) => {
                let _ = write!(out, r#"<div class="plain">{}</div>"#, escape_html(text));
            }
        }
    }
}

pub fn render_response(value: &Value) -> String {
    interpret(value).to_html()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_with_sources() {
        let value = json!({ "answer": "X", "sources": [{ "title": "T", "url": "U" }] });
        let rendered = interpret(&value);
        assert_eq!(
            rendered,
            Rendered::Object {
                text: Some("X".to_string()),
                references: vec![Reference::Link { label: "T".into(), url: "U".into() }],
                raw: value.clone(),
            }
        );

        let html = rendered.to_html();
        assert!(html.contains(r#"<div class="ocean-card response-text">X</div>"#));
        assert!(html.contains(r#"<a href="U" target="_blank" rel="noopener noreferrer">T</a>"#));
        assert!(html.contains("<summary>Raw JSON</summary>"));
        assert!(html.contains(&escape_html(&pretty(&value))));
    }

    #[test]
    fn list_items_are_labeled_recursively() {
        let value = json!([1, "two", { "content": "three" }]);
        let Rendered::Items(items) = interpret(&value) else {
            panic!("expected items");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Rendered::Plain("1".into()));
        assert_eq!(items[1], Rendered::Plain("two".into()));
        assert!(matches!(&items[2], Rendered::Object { text: Some(t), .. } if t == "three"));

        let html = render_response(&value);
        for label in ["Item 1", "Item 2", "Item 3"] {
            assert!(html.contains(label));
        }
        assert!(html.contains(r#"<div class="ocean-card response-text">three</div>"#));
    }

    #[test]
    fn text_key_priority_skips_non_strings() {
        let value = json!({ "answer": { "nested": true }, "output": "from output", "text": "from text" });
        assert!(matches!(interpret(&value), Rendered::Object { text: Some(t), .. } if t == "from output"));
    }

    #[test]
    fn empty_leading_text_hides_later_keys() {
        let value = json!({ "answer": "", "response": "R" });
        assert!(matches!(interpret(&value), Rendered::Object { text: None, .. }));
        assert!(!render_response(&value).contains("response-text"));
    }

    #[test]
    fn object_without_text_still_exposes_raw_json() {
        let value = json!({ "status": "queued" });
        let html = render_response(&value);
        assert!(!html.contains("response-text"));
        assert!(html.contains("Raw JSON"));
        assert!(html.contains("queued"));
    }

    #[test]
    fn empty_references_fall_through_to_next_key() {
        let value = json!({
            "references": [],
            "citations": [{ "id": "c-1" }, "plain note"],
            "sources": [{ "title": "ignored", "url": "http://x" }]
        });
        let Rendered::Object { references, .. } = interpret(&value) else {
            panic!("expected object");
        };
        assert_eq!(
            references,
            vec![
                Reference::Json(pretty(&json!({ "id": "c-1" }))),
                Reference::Plain("plain note".into()),
            ]
        );
    }

    #[test]
    fn reference_label_defaults_to_source() {
        let value = json!({ "sources": [{ "url": "https://example.org/doc" }] });
        let Rendered::Object { references, .. } = interpret(&value) else {
            panic!("expected object");
        };
        assert_eq!(
            references,
            vec![Reference::Link { label: "Source".into(), url: "https://example.org/doc".into() }]
        );
    }

    #[test]
    fn script_urls_are_not_linked() {
        let value = json!({ "sources": [{ "title": "bad", "url": "javascript:alert(1)" }] });
        assert!(!render_response(&value).contains("<a href"));
    }

    #[test]
    fn null_and_scalars() {
        assert_eq!(interpret(&Value::Null), Rendered::Empty);
        assert!(render_response(&Value::Null).contains("Empty response."));
        assert_eq!(interpret(&json!(true)), Rendered::Plain("true".into()));
        assert_eq!(interpret(&json!("<b>hi</b>")).to_html(), r#"<div class="plain">&lt;b&gt;hi&lt;/b&gt;</div>"#);
    }
}

//! Portable Text to HTML.
//!
//! Handles the default block styles, bullet/number lists nested by `level`,
//! the standard decorators and `link` annotations. Anything else is dropped
//! with a warning so an unexpected block never takes down a page.

use askama_escape::{escape, Html};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Write;

use crate::models::{lenient, lenient_vec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortableBlock {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub style: Option<String>,
    #[serde(rename = "listItem", default, deserialize_with = "lenient")]
    pub list_item: Option<String>,
    #[serde(default, deserialize_with = "list_level")]
    pub level: Option<u32>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub children: Vec<Span>,
    #[serde(rename = "markDefs", default, deserialize_with = "lenient_vec")]
    pub mark_defs: Vec<MarkDef>,
}

/// Any JSON number, truncated; `1.0` is level 1.
fn list_level<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let level: Option<f64> = lenient(deserializer)?;
    Ok(level.filter(|l| l.is_finite()).map(|l| l.clamp(0.0, u32::MAX as f64) as u32))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "_type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    fn from_item(item: &str) -> Self {
        match item {
            "number" => ListKind::Number,
            _ => ListKind::Bullet,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "ul",
            ListKind::Number => "ol",
        }
    }
}

pub fn to_html(blocks: &[PortableBlock]) -> String {
    let mut out = String::new();
    // Open lists, innermost last; each one has an unclosed <li>.
    let mut lists: Vec<(u32, ListKind)> = Vec::new();

    for block in blocks {
        if block.kind != "block" {
            close_lists(&mut out, &mut lists);
            tracing::warn!(block_type = %block.kind, key = ?block.key, "skipping unknown block type");
            continue;
        }

        match block.list_item.as_deref() {
            Some(item) => {
                let level = block.level.unwrap_or(1).max(1);
                let kind = ListKind::from_item(item);
                open_list_item(&mut out, &mut lists, level, kind);
                render_children(&mut out, block);
            }
            None => {
                close_lists(&mut out, &mut lists);
                let tag = block_tag(block.style.as_deref());
                let _ = write!(out, "<{tag}>");
                render_children(&mut out, block);
                let _ = write!(out, "</{tag}>");
            }
        }
    }
    close_lists(&mut out, &mut lists);
    out
}

fn open_list_item(out: &mut String, lists: &mut Vec<(u32, ListKind)>, level: u32, kind: ListKind) {
    loop {
        match lists.last().copied() {
            Some((top, top_kind)) if top == level && top_kind == kind => {
                out.push_str("</li><li>");
                return;
            }
            Some((top, _)) if top < level => break,
            Some(_) => {
                let (_, closing) = lists.pop().unwrap_or((level, kind));
                let _ = write!(out, "</li></{}>", closing.tag());
            }
            None => break,
        }
    }
    let _ = write!(out, "<{}><li>", kind.tag());
    lists.push((level, kind));
}

fn close_lists(out: &mut String, lists: &mut Vec<(u32, ListKind)>) {
    while let Some((_, kind)) = lists.pop() {
        let _ = write!(out, "</li></{}>", kind.tag());
    }
}

fn block_tag(style: Option<&str>) -> &'static str {
    match style.unwrap_or("normal") {
        "h1" => "h1",
        "h2" => "h2",
        "h3" => "h3",
        "h4" => "h4",
        "h5" => "h5",
        "h6" => "h6",
        "blockquote" => "blockquote",
        _ => "p",
    }
}

fn render_children(out: &mut String, block: &PortableBlock) {
    for span in &block.children {
        if span.kind != "span" && !span.kind.is_empty() {
            tracing::warn!(span_type = %span.kind, "skipping unknown inline type");
            continue;
        }

        let mut closers = Vec::with_capacity(span.marks.len());
        for mark in &span.marks {
            closers.push(open_mark(out, mark, &block.mark_defs));
        }
        render_text(out, &span.text);
        for closer in closers.iter().rev() {
            out.push_str(closer);
        }
    }
}

/// Writes the opening tag for `mark` and returns the matching closing tag.
fn open_mark(out: &mut String, mark: &str, defs: &[MarkDef]) -> &'static str {
    match mark {
        "strong" => {
            out.push_str("<strong>");
            "</strong>"
        }
        "em" => {
            out.push_str("<em>");
            "</em>"
        }
        "code" => {
            out.push_str("<code>");
            "</code>"
        }
        "underline" => {
            out.push_str(r#"<span style="text-decoration:underline">"#);
            "</span>"
        }
        "strike-through" => {
            out.push_str("<del>");
            "</del>"
        }
        key => match defs.iter().find(|d| d.key == key) {
            Some(def) if def.kind == "link" => {
                let href = def.href.as_deref().unwrap_or_default();
                let _ = write!(out, r#"<a href="{}">"#, escape(href, Html));
                "</a>"
            }
            Some(def) => {
                let _ = write!(out, r#"<span class="unknown__pt__mark__{}">"#, escape(&def.kind, Html));
                "</span>"
            }
            None => {
                let _ = write!(out, r#"<span class="unknown__pt__mark__{}">"#, escape(key, Html));
                "</span>"
            }
        },
    }
}

fn render_text(out: &mut String, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br/>");
        }
        let _ = write!(out, "{}", escape(line, Html));
    }
}

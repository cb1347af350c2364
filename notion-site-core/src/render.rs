//! Default markdown renderer.
//!
//! Writes a YAML front-matter header followed by the page body. Each block is dispatched
//! on its [`BlockKind`]; embeds and media become shortcodes named by the block's tag when a
//! shortcode syntax is configured.

use serde::Deserialize;
use serde_json::Value;
use std::io::Write;

use crate::block::{Block, BlockKind};
use crate::config::MarkdownConfig;
use crate::contract::{RenderContext, Renderer};
use crate::error::RenderError;
use crate::manifest::FrontMatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shortcodes {
    Hugo,
    Hexo,
}

impl Shortcodes {
    fn from_config(config: &MarkdownConfig) -> Option<Self> {
        match config.shortcode_syntax.as_deref()?.to_ascii_lowercase().as_str() {
            "hugo" => Some(Shortcodes::Hugo),
            "hexo" => Some(Shortcodes::Hexo),
            other => {
                tracing::warn!(syntax = other, "Unknown shortcode syntax, rendering plain links");
                None
            }
        }
    }

    fn render(self, name: &str, url: &str) -> String {
        match self {
            Shortcodes::Hugo => format!("{{{{< {name} url=\"{url}\" >}}}}"),
            Shortcodes::Hexo => format!("{{% {name} {url} %}}"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for MarkdownRenderer {
    fn generate_to(
        &self,
        ctx: RenderContext<'_>,
        sink: &mut dyn Write,
    ) -> Result<FrontMatter, RenderError> {
        let header = serde_yaml::to_string(&ctx.front_matter)?;
        let body = render_body(ctx.blocks, &ctx.config.markdown);

        write!(sink, "---\n{header}---\n\n{body}")?;
        Ok(ctx.front_matter)
    }
}

/// Renders a block tree to markdown.
pub fn render_body(blocks: &[Block], config: &MarkdownConfig) -> String {
    let mut out = String::new();
    BlockWriter {
        shortcodes: Shortcodes::from_config(config),
    }
    .write_blocks(blocks, &mut out);
    let body = out.trim_end_matches('\n');
    if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}

struct BlockWriter {
    shortcodes: Option<Shortcodes>,
}

impl BlockWriter {
    fn write_blocks(&self, blocks: &[Block], out: &mut String) {
        let mut number = 0;
        for block in blocks {
            number = match block.kind {
                BlockKind::NumberedListItem => number + 1,
                _ => 0,
            };
            // Blocks are separated by exactly one blank line; their own content is untouched.
            let mut chunk = String::new();
            self.write_block(block, number, &mut chunk);
            let chunk = chunk.trim_matches('\n');
            if chunk.is_empty() {
                continue;
            }
            out.push_str(chunk);
            out.push_str("\n\n");
        }
    }

    fn write_block(&self, block: &Block, number: usize, out: &mut String) {
        let p = &block.payload;
        match block.kind {
            BlockKind::Paragraph => {
                out.push_str(&rich_text(p));
                out.push_str("\n\n");
                self.write_blocks(&block.children, out);
            }
            BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => {
                let level = match block.kind {
                    BlockKind::Heading1 => 1,
                    BlockKind::Heading2 => 2,
                    _ => 3,
                };
                out.push_str(&format!("{} {}\n\n", "#".repeat(level), rich_text(p)));
                self.write_blocks(&block.children, out);
            }
            BlockKind::BulletedListItem => self.list_item("- ", block, out),
            BlockKind::NumberedListItem => self.list_item(&format!("{number}. "), block, out),
            BlockKind::ToDo => {
                let mark = if p.get("checked").and_then(Value::as_bool).unwrap_or(false) {
                    "- [x] "
                } else {
                    "- [ ] "
                };
                self.list_item(mark, block, out);
            }
            BlockKind::Toggle => {
                out.push_str(&format!("<details>\n<summary>{}</summary>\n\n", rich_text(p)));
                self.write_blocks(&block.children, out);
                out.push_str("</details>\n\n");
            }
            BlockKind::Code => {
                let language = p.get("language").and_then(Value::as_str).unwrap_or("");
                let language = if language == "plain text" { "" } else { language };
                out.push_str(&format!("```{language}\n{}\n```\n\n", plain_text(p)));
            }
            BlockKind::Quote => {
                let mut inner = rich_text(p);
                if !block.children.is_empty() {
                    let mut children = String::new();
                    self.write_blocks(&block.children, &mut children);
                    inner = format!("{inner}\n\n{}", children.trim_end());
                }
                out.push_str(&quoted(&inner));
            }
            BlockKind::Callout => {
                let icon = p
                    .get("icon")
                    .and_then(|i| i.get("emoji"))
                    .and_then(Value::as_str)
                    .map(|e| format!("{e} "))
                    .unwrap_or_default();
                out.push_str(&quoted(&format!("{icon}{}", rich_text(p))));
                self.write_blocks(&block.children, out);
            }
            BlockKind::Divider => out.push_str("---\n\n"),
            BlockKind::Equation => {
                let expr = p.get("expression").and_then(Value::as_str).unwrap_or("");
                out.push_str(&format!("$$\n{expr}\n$$\n\n"));
            }
            BlockKind::Image => {
                let url = file_url(p).unwrap_or_default();
                out.push_str(&format!("![{}]({url})\n\n", caption(p)));
            }
            BlockKind::Video
            | BlockKind::Audio
            | BlockKind::File
            | BlockKind::Pdf
            | BlockKind::Bookmark
            | BlockKind::Embed
            | BlockKind::LinkPreview => {
                let url = p
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| file_url(p))
                    .unwrap_or_default();
                match self.shortcodes {
                    Some(sc) => out.push_str(&sc.render(&block.kind.tag(), &url)),
                    None => {
                        let label = Some(caption(p)).filter(|c| !c.is_empty()).unwrap_or_else(|| url.clone());
                        out.push_str(&format!("[{label}]({url})"));
                    }
                }
                out.push_str("\n\n");
            }
            BlockKind::Table => {
                let header = p
                    .get("has_column_header")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                out.push_str(&table(&block.children, header));
            }
            BlockKind::TableRow => {
                out.push_str(&table_row(p));
                out.push('\n');
            }
            BlockKind::ColumnList | BlockKind::Column | BlockKind::SyncedBlock | BlockKind::Template => {
                self.write_blocks(&block.children, out);
            }
            BlockKind::ChildPage => {
                let title = p.get("title").and_then(Value::as_str).unwrap_or_default();
                out.push_str(&format!("**{title}**\n\n"));
            }
            BlockKind::TableOfContents => {
                if let Some(sc) = self.shortcodes {
                    out.push_str(&match sc {
                        Shortcodes::Hugo => "{{< toc >}}\n\n".to_string(),
                        Shortcodes::Hexo => "{% toc %}\n\n".to_string(),
                    });
                }
            }
            BlockKind::Breadcrumb => {}
            BlockKind::LinkToPage | BlockKind::ChildDatabase | BlockKind::Unsupported => {
                out.push_str(&format!("<!-- {}: {} -->\n\n", block.kind.tag(), block.id));
            }
        }
    }

    fn list_item(&self, marker: &str, block: &Block, out: &mut String) {
        out.push_str(marker);
        out.push_str(&rich_text(&block.payload));
        out.push('\n');
        if !block.children.is_empty() {
            let mut children = String::new();
            self.write_blocks(&block.children, &mut children);
            for line in children.trim_end().lines() {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out.push('\n');
    }
}

#[derive(Debug, Default, Deserialize)]
struct RichText {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    plain_text: String,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    annotations: Annotations,
    #[serde(default)]
    equation: Option<InlineEquation>,
}

#[derive(Debug, Default, Deserialize)]
struct Annotations {
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    strikethrough: bool,
    #[serde(default)]
    code: bool,
}

#[derive(Debug, Default, Deserialize)]
struct InlineEquation {
    expression: String,
}

fn parse_rich_text(value: Option<&Value>) -> Vec<RichText> {
    value
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Markdown for the payload's `rich_text` array, annotations applied.
fn rich_text(payload: &Value) -> String {
    parse_rich_text(payload.get("rich_text"))
        .iter()
        .map(format_span)
        .collect()
}

/// Concatenated plain text, no markup. Used for code.
fn plain_text(payload: &Value) -> String {
    parse_rich_text(payload.get("rich_text"))
        .into_iter()
        .map(|t| t.plain_text)
        .collect()
}

fn caption(payload: &Value) -> String {
    parse_rich_text(payload.get("caption"))
        .into_iter()
        .map(|t| t.plain_text)
        .collect()
}

fn format_span(span: &RichText) -> String {
    if span.kind == "equation" {
        if let Some(eq) = &span.equation {
            return format!("${}$", eq.expression);
        }
    }
    let text = span.plain_text.as_str();
    if text.trim().is_empty() {
        return text.to_string();
    }

    let mut s = text.to_string();
    let a = &span.annotations;
    if a.code {
        s = format!("`{s}`");
    }
    if a.bold {
        s = format!("**{s}**");
    }
    if a.italic {
        s = format!("*{s}*");
    }
    if a.strikethrough {
        s = format!("~~{s}~~");
    }
    if let Some(href) = &span.href {
        s = format!("[{s}]({href})");
    }
    s
}

/// URL of a file object, either `external` or Notion-hosted.
fn file_url(payload: &Value) -> Option<String> {
    let kind = payload.get("type").and_then(Value::as_str)?;
    payload
        .get(kind)?
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn quoted(text: &str) -> String {
    let mut out: String = text
        .lines()
        .map(|l| if l.is_empty() { ">\n".to_string() } else { format!("> {l}\n") })
        .collect();
    if out.is_empty() {
        out.push_str(">\n");
    }
    out.push('\n');
    out
}

fn table_cells(row: &Value) -> Vec<String> {
    row.get("cells")
        .and_then(Value::as_array)
        .map(|cells| {
            cells
                .iter()
                .map(|cell| {
                    serde_json::from_value::<Vec<RichText>>(cell.clone())
                        .unwrap_or_default()
                        .iter()
                        .map(format_span)
                        .collect::<String>()
                        .replace('|', "\\|")
                })
                .collect()
        })
        .unwrap_or_default()
}

fn table_row(row: &Value) -> String {
    format!("| {} |", table_cells(row).join(" | "))
}

fn table(rows: &[Block], has_header: bool) -> String {
    let rows: Vec<&Block> = rows.iter().filter(|r| r.kind == BlockKind::TableRow).collect();
    let Some(first) = rows.first() else {
        return String::new();
    };
    let width = table_cells(&first.payload).len().max(1);
    let mut out = String::new();
    let body = if has_header {
        out.push_str(&table_row(&first.payload));
        &rows[1..]
    } else {
        out.push_str(&format!("|{}", " |".repeat(width)));
        &rows[..]
    };
    out.push('\n');
    out.push_str(&format!("|{}\n", " --- |".repeat(width)));
    for row in body {
        out.push_str(&table_row(&row.payload));
        out.push('\n');
    }
    out.push('\n');
    out
}

use markdown::mdast::{self, Node};
use markdown::{to_mdast, ParseOptions};

use super::escape::{escape_into, escape_with_breaks, safe_language, safe_link_target};
use super::{MessageRole, Renderer, SafeMarkup};

/// Renders assistant and system text as GFM and user text as escaped plain
/// text.
///
/// Output uses a fixed set of elements: `p`, `h1`-`h6`, `em`, `strong`, `del`,
/// `code`, `pre`, `ul`, `ol`, `li`, `blockquote`, `hr`, `br`, `a` and the table
/// elements. Raw HTML in the source is shown as text, images collapse to their
/// alt text, and links keep an `href` only for `http`, `https` and `mailto`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_markdown(&self, text: &str) -> SafeMarkup {
        match to_mdast(text, &ParseOptions::gfm()) {
            Ok(root) => {
                let mut out = String::with_capacity(text.len() + text.len() / 4);
                write_node(&root, &mut out);
                SafeMarkup::from_sanitized(out)
            }
            Err(_) => {
                tracing::debug!("markdown parse failed; rendering as plain text");
                SafeMarkup::escaped(text)
            }
        }
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, text: &str, role: MessageRole) -> SafeMarkup {
        match role {
            MessageRole::User => SafeMarkup::escaped(text),
            MessageRole::Assistant | MessageRole::System => self.render_markdown(text),
        }
    }
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        write_node(node, out);
    }
}

fn write_element(tag: &str, children: &[Node], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_nodes(children, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Root(root) => write_nodes(&root.children, out),
        Node::Paragraph(paragraph) => write_element("p", &paragraph.children, out),
        Node::Heading(heading) => {
            let tag = format!("h{}", heading.depth.clamp(1, 6));
            write_element(&tag, &heading.children, out);
        }
        Node::Text(text) => escape_with_breaks(&text.value, out),
        Node::Emphasis(emphasis) => write_element("em", &emphasis.children, out),
        Node::Strong(strong) => write_element("strong", &strong.children, out),
        Node::Delete(delete) => write_element("del", &delete.children, out),
        Node::Break(_) => out.push_str("<br>"),
        Node::InlineCode(code) => {
            out.push_str("<code>");
            escape_into(&code.value, out);
            out.push_str("</code>");
        }
        Node::InlineMath(math) => {
            out.push_str("<code>");
            escape_into(&math.value, out);
            out.push_str("</code>");
        }
        Node::Code(code) => write_code_block(code.lang.as_deref(), &code.value, out),
        Node::Math(math) => write_code_block(None, &math.value, out),
        Node::Blockquote(quote) => write_element("blockquote", &quote.children, out),
        Node::ThematicBreak(_) => out.push_str("<hr>"),
        Node::List(list) => write_list(list, out),
        Node::ListItem(item) => write_list_item(item, false, out),
        Node::Table(table) => write_table(table, out),
        Node::Link(link) => match safe_link_target(&link.url) {
            Some(href) => {
                out.push_str("<a href=\"");
                escape_into(href, out);
                out.push_str("\" rel=\"noopener noreferrer nofollow\" target=\"_blank\">");
                write_nodes(&link.children, out);
                out.push_str("</a>");
            }
            None => write_nodes(&link.children, out),
        },
        Node::LinkReference(reference) => write_nodes(&reference.children, out),
        Node::Image(image) => escape_with_breaks(&image.alt, out),
        Node::ImageReference(image) => escape_with_breaks(&image.alt, out),
        Node::Html(html) => escape_with_breaks(&html.value, out),
        Node::FootnoteReference(footnote) => {
            out.push_str("[^");
            escape_into(&footnote.identifier, out);
            out.push(']');
        }
        Node::Definition(_) | Node::Yaml(_) | Node::Toml(_) => {}
        other => {
            if let Some(children) = other.children() {
                write_nodes(children, out);
            }
        }
    }
}

fn write_code_block(lang: Option<&str>, value: &str, out: &mut String) {
    out.push_str("<pre><code");
    if let Some(lang) = lang.and_then(safe_language) {
        out.push_str(" class=\"language-");
        out.push_str(lang);
        out.push('"');
    }
    out.push('>');
    escape_into(value, out);
    out.push_str("</code></pre>");
}

fn write_list(list: &mdast::List, out: &mut String) {
    let tag = if list.ordered { "ol" } else { "ul" };
    match list.start {
        Some(start) if list.ordered && start != 1 => {
            out.push_str(&format!("<ol start=\"{start}\">"));
        }
        _ => {
            out.push('<');
            out.push_str(tag);
            out.push('>');
        }
    }

    for child in &list.children {
        match child {
            Node::ListItem(item) => write_list_item(item, !list.spread, out),
            // Only <li> may sit directly inside a list.
            other => {
                out.push_str("<li>");
                write_node(other, out);
                out.push_str("</li>");
            }
        }
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

// Tight items drop the paragraph wrapper around their text.
fn write_list_item(item: &mdast::ListItem, tight: bool, out: &mut String) {
    out.push_str("<li>");
    match item.checked {
        Some(true) => out.push_str("☑ "),
        Some(false) => out.push_str("☐ "),
        None => {}
    }
    for child in &item.children {
        match child {
            Node::Paragraph(paragraph) if tight && !item.spread => {
                write_nodes(&paragraph.children, out)
            }
            other => write_node(other, out),
        }
    }
    out.push_str("</li>");
}

fn write_table(table: &mdast::Table, out: &mut String) {
    let mut rows = table.children.iter().filter_map(|node| match node {
        Node::TableRow(row) => Some(row),
        _ => None,
    });

    out.push_str("<table>");
    if let Some(header) = rows.next() {
        out.push_str("<thead>");
        write_table_row(header, "th", out);
        out.push_str("</thead>");
    }

    let body: Vec<&mdast::TableRow> = rows.collect();
    if !body.is_empty() {
        out.push_str("<tbody>");
        for row in body {
            write_table_row(row, "td", out);
        }
        out.push_str("</tbody>");
    }
    out.push_str("</table>");
}

fn write_table_row(row: &mdast::TableRow, cell_tag: &str, out: &mut String) {
    out.push_str("<tr>");
    for cell in &row.children {
        if let Node::TableCell(cell) = cell {
            write_element(cell_tag, &cell.children, out);
        }
    }
    out.push_str("</tr>");
}

#[cfg(test)]
mod tests {
    use super::HtmlRenderer;
    use crate::render::{MessageRole, Renderer};
    use pretty_assertions::assert_eq;

    fn assistant(text: &str) -> String {
        HtmlRenderer::new()
            .render(text, MessageRole::Assistant)
            .into_string()
    }

    #[test]
    fn emphasis_and_headings() {
        assert_eq!(
            assistant("# Laços\n\nUse *for* ou **while**."),
            "<h1>Laços</h1><p>Use <em>for</em> ou <strong>while</strong>.</p>"
        );
    }

    #[test]
    fn single_newlines_become_breaks() {
        assert_eq!(assistant("linha 1\nlinha 2"), "<p>linha 1<br>linha 2</p>");
    }

    #[test]
    fn fenced_code_keeps_language_class() {
        assert_eq!(
            assistant("```rust\nfn main() {\n    println!(\"<oi>\");\n}\n```"),
            "<pre><code class=\"language-rust\">fn main() {\n    println!(&quot;&lt;oi&gt;&quot;);\n}</code></pre>"
        );
    }

    #[test]
    fn unclosed_fence_still_renders_as_code() {
        let html = assistant("Exemplo:\n\n```python\nprint(1)");
        assert!(html.contains("<pre><code class=\"language-python\">print(1)"));
    }

    #[test]
    fn hostile_language_name_is_dropped() {
        let html = assistant("```x\"onclick=\"alert(1)\nbody\n```");
        assert!(!html.contains("class="));
        assert!(!html.contains("onclick=\""));
    }

    #[test]
    fn tight_and_ordered_lists() {
        assert_eq!(
            assistant("- um\n- dois"),
            "<ul><li>um</li><li>dois</li></ul>"
        );
        assert_eq!(assistant("3. três\n4. quatro"), "<ol start=\"3\"><li>três</li><li>quatro</li></ol>");
    }

    #[test]
    fn stray_list_children_are_wrapped_in_items() {
        let html = assistant("* a\n\n  <script>\n* b");
        assert!(!html.contains("<ul><ul>"), "{html}");
        assert!(!html.contains("</li><ul>"), "{html}");
        assert!(!html.contains("<script>"), "{html}");
        assert!(html.starts_with("<ul><li>"), "{html}");
        assert!(html.ends_with("</li></ul>"), "{html}");
    }

    #[test]
    fn tables_render_head_and_body() {
        assert_eq!(
            assistant("| a | b |\n|---|---|\n| 1 | 2 |"),
            "<table><thead><tr><th>a</th><th>b</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn script_blocks_are_escaped() {
        let html = assistant("<script>alert('x')</script>");
        assert!(!html.contains("<script"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn inline_html_is_escaped() {
        let html = assistant("antes <img src=x onerror=alert(1)> depois");
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn unsafe_links_lose_their_target() {
        assert_eq!(assistant("[clique](javascript:alert(1))"), "<p>clique</p>");
        assert_eq!(
            assistant("[docs](https://doc.rust-lang.org)"),
            "<p><a href=\"https://doc.rust-lang.org\" rel=\"noopener noreferrer nofollow\" target=\"_blank\">docs</a></p>"
        );
    }

    #[test]
    fn images_collapse_to_alt_text() {
        assert_eq!(
            assistant("![diagrama de fluxo](https://example.com/a.png)"),
            "<p>diagrama de fluxo</p>"
        );
    }

    #[test]
    fn user_text_is_never_interpreted() {
        let html = HtmlRenderer::new()
            .render("**oi**\n<b>x</b>", MessageRole::User)
            .into_string();
        assert_eq!(html, "**oi**<br>&lt;b&gt;x&lt;/b&gt;");
    }

    #[test]
    fn empty_text_renders_nothing() {
        assert_eq!(assistant(""), "");
    }
}

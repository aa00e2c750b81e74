//! Building a [`Document`] from markup.
//!
//! The builder is tolerant: it never fails. Unmatched end tags are dropped,
//! an end tag closes the nearest open element with the same name, and void
//! elements never take children.

use markup_regions_syntax::{TokenKind, lex, scan_end_tag, scan_start_tag};
use pulldown_cmark::{Options, Parser, html};

use super::{Document, NodeId, NodeKind};

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

impl Document {
    /// Parse an HTML fragment. Its nodes hang directly off [`Document::top`].
    pub fn parse_html(markup: &str) -> Self {
        let mut doc = Document::new();
        let top = doc.top();
        let mut open: Vec<(String, NodeId)> = Vec::new();

        for token in lex(markup) {
            let parent = open.last().map(|(_, id)| *id).unwrap_or(top);
            match token.kind {
                TokenKind::Text | TokenKind::Lt => {
                    doc.push_text(parent, &html_escape::decode_html_entities(token.text));
                }
                TokenKind::StartTag => match scan_start_tag(token.text) {
                    Some(tag) => {
                        let attrs = tag
                            .attrs
                            .into_iter()
                            .map(|(name, value)| {
                                let value = html_escape::decode_html_entities(&value).into_owned();
                                (name, value)
                            })
                            .collect();
                        let element = doc.create_element(tag.name.clone(), attrs);
                        doc.push_node(parent, element);
                        if !tag.self_closing && !is_void_element(&tag.name) {
                            open.push((tag.name, element));
                        }
                    }
                    None => doc.push_text(parent, token.text),
                },
                TokenKind::EndTag => {
                    if let Some(name) = scan_end_tag(token.text)
                        && let Some(index) = open
                            .iter()
                            .rposition(|(open_name, _)| *open_name == name)
                    {
                        open.truncate(index);
                    }
                }
                TokenKind::Comment => {
                    let body = token.text.trim_start_matches("<!--");
                    let body = body.strip_suffix("-->").unwrap_or(body);
                    let comment = doc.create_comment(body);
                    doc.push_node(parent, comment);
                }
                TokenKind::Declaration => {}
            }
        }

        doc
    }

    /// Render Markdown to HTML and parse the result
    pub fn from_markdown(markdown: &str) -> Self {
        let parser = Parser::new_ext(
            markdown,
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
        );
        let mut rendered = String::new();
        html::push_html(&mut rendered, parser);
        Self::parse_html(&rendered)
    }

    /// First element child of the top node, the usual mount point for a
    /// fragment wrapped in a single container
    pub fn first_element(&self) -> Option<NodeId> {
        self.children(self.top())
            .iter()
            .copied()
            .find(|&n| self.is_element(n))
    }

    // Parser-internal append: the parent is always a live element created by
    // this builder, so the checks in `append_child` cannot fail.
    fn push_node(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn push_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeKind::Text(existing) = &mut self.nodes[last.0].kind
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text(text);
        self.push_node(parent, node);
    }
}

use markup_regions_engine::{Document, NodeId, NodeKind, Region, Session};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figure", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre",
    "section", "table", "tr", "ul",
];

/// Flatten the mounted document into styled terminal lines. Text inside a
/// region's markers takes the region's color; the selected region is bold.
pub fn document_lines(session: &Session) -> Vec<Line<'static>> {
    let (Some(doc), Some(root)) = (session.document(), session.root()) else {
        return Vec::new();
    };
    let mut out = LineBuilder::default();
    walk(doc, root, session, Style::default(), &mut out);
    out.finish()
}

fn walk(doc: &Document, node: NodeId, session: &Session, style: Style, out: &mut LineBuilder) {
    for &child in doc.children(node) {
        match doc.kind(child) {
            Some(NodeKind::Text(text)) => out.push_text(text, style),
            Some(NodeKind::Element { tag, .. }) => {
                if tag == "br" {
                    out.break_line();
                    continue;
                }
                let block = BLOCK_TAGS.contains(&tag.as_str());
                if block {
                    out.break_line();
                }
                let inner = match marker_region(doc, child, session) {
                    Some(region) => style.patch(region_style(region)),
                    None => style,
                };
                walk(doc, child, session, inner, out);
                if block {
                    out.break_line();
                }
            }
            Some(NodeKind::Comment(_)) | None => {}
        }
    }
}

fn marker_region<'a>(doc: &Document, node: NodeId, session: &'a Session) -> Option<&'a Region> {
    if !doc.has_class(node, &session.config().marker_class) {
        return None;
    }
    let owner = doc.attr(node, "data-region")?;
    session
        .regions()
        .iter()
        .find(|r| r.id.to_string() == owner)
}

fn region_style(region: &Region) -> Style {
    let mut style = Style::default();
    if let Some(color) = region.color() {
        style = style.bg(Color::Rgb(color.r, color.g, color.b)).fg(Color::Black);
    }
    if region.is_selected() || region.is_highlighted() {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    style
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn push_text(&mut self, text: &str, style: Style) {
        let collapsed = collapse_whitespace(text);
        if self.current.is_empty() && collapsed.trim().is_empty() {
            return;
        }
        self.current.push(Span::styled(collapsed, style));
    }

    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        self.lines
    }
}

/// HTML whitespace rules: every run becomes one space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

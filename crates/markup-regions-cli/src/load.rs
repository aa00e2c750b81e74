use anyhow::{Context, Result};
use markup_regions_config::Config;
use markup_regions_engine::{
    Document, DocumentOrigin, LabelState, LabelStateSource, NodeId, Session,
};
use std::path::Path;

const PALETTE: &[&str] = &[
    "orange", "#1e90ff", "lime", "magenta", "yellow", "cyan", "pink", "teal",
];

/// Colors labels by their first selected value. The viewer never has active
/// labels, so it cannot create regions of its own.
pub struct LabelPalette;

impl LabelStateSource for LabelPalette {
    fn active_states(&self) -> Vec<LabelState> {
        Vec::new()
    }

    fn selected_color(&self, state: &LabelState) -> Option<String> {
        let key = state.selected.first().unwrap_or(&state.name);
        let hash = key
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)));
        Some(PALETTE[hash % PALETTE.len()].to_string())
    }
}

/// Parse a document file, Markdown by extension and HTML otherwise.
///
/// HTML mounts at its first element, Markdown at the document top.
pub fn read_document(path: &Path) -> Result<(Document, NodeId)> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    let is_markdown = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "markdown")
    );

    if is_markdown {
        let doc = Document::from_markdown(&source);
        let root = doc.top();
        Ok((doc, root))
    } else {
        let doc = Document::parse_html(&source);
        let root = doc.first_element().unwrap_or(doc.top());
        Ok((doc, root))
    }
}

/// Build a session for `document`, restore `records` into it and bind them.
/// Returns the session with a one-line summary of the restore.
pub fn open_session(
    config: &Config,
    document: &Path,
    records: Option<&Path>,
) -> Result<(Session, String)> {
    let (doc, root) = read_document(document)?;
    let name = document
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("text");
    let origin = DocumentOrigin::new(name, document.display().to_string());
    let mut session = Session::new(config.highlight(), origin);
    let mut delegate = config.flat_kinds();

    let mut skipped = 0;
    if let Some(path) = records {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records {}", path.display()))?;
        let outcomes = session
            .restore_json(&json, &mut delegate)
            .with_context(|| format!("{} is not a record array", path.display()))?;
        skipped = outcomes.iter().filter(|o| o.is_err()).count();
    }

    session.mount(doc, root)?;
    let report = session.bind_all(&LabelPalette)?;

    let status = format!(
        "{} bound, {} unresolved, {} skipped, {} delegated",
        report.bound.len(),
        report.failed.len(),
        skipped,
        delegate.restored().len()
    );
    log::info!("{status}");
    Ok((session, status))
}

use crate::anchoring::{AnchorResolutionError, Captured, RangeAnchorer, split_boundaries};
use crate::dom::{Document, DomError, NodeId, TextRange};
use crate::highlight::{HighlightError, HighlightRenderer, MarkerStyle, Rgba};
use crate::regions::{
    ControlDescriptor, DocumentOrigin, LabelStateSource, RecordDelegate, RecordError, Region,
    RegionId, RegionRecord, RegionStore, RestoreOutcome, StoreError, records_from_json,
    restore_record, to_records,
};

/// Presentation and capture settings for a [`Session`].
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightConfig {
    pub marker_class: String,
    pub resting_opacity: f32,
    pub selected_opacity: f32,
    pub selection_enabled: bool,
    pub adjust_selection: bool,
    /// Drop live selections made while no label is active
    pub require_active_labels: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            marker_class: "htx-highlight".to_string(),
            resting_opacity: 0.3,
            selected_opacity: 0.8,
            selection_enabled: true,
            adjust_selection: false,
            require_active_labels: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No document is mounted")]
    NotMounted,
    #[error("Unknown region {0}")]
    UnknownRegion(RegionId),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Highlight(#[from] HighlightError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why one pending region could not be bound
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BindError {
    #[error("Anchor did not resolve: {0}")]
    Resolve(#[from] AnchorResolutionError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Highlight(#[from] HighlightError),
}

/// What a selection-end event produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionOutcome {
    pub region: Option<RegionId>,
    /// Ranges that missed the root, for the caller to restore its selection
    pub rejected: Vec<TextRange>,
}

/// Result of binding every pending region
#[derive(Debug, Default)]
pub struct BindReport {
    pub bound: Vec<RegionId>,
    pub failed: Vec<(RegionId, BindError)>,
}

impl BindReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
struct Mounted {
    doc: Document,
    root: NodeId,
}

/// Owner of one live document and the regions anchored in it.
///
/// Regions can be created before a document is mounted (from records) and
/// are bound to markers by [`Session::bind_all`] once it is. Unmounting
/// unwraps every marker before handing the document back.
///
/// ```rust
/// # use markup_regions_engine::{Document, DocumentOrigin, HighlightConfig, LabelState, LabelStateSource, Session, TextRange};
/// struct Labels;
///
/// impl LabelStateSource for Labels {
///     fn active_states(&self) -> Vec<LabelState> {
///         vec![LabelState::new("tag", "labels", vec!["Animal".into()])]
///     }
///     fn selected_color(&self, _: &LabelState) -> Option<String> {
///         Some("#ff0000".into())
///     }
/// }
///
/// let doc = Document::parse_html("<div>The quick brown fox</div>");
/// let root = doc.first_element().unwrap();
/// let text = doc.children(root)[0];
///
/// let mut session = Session::new(HighlightConfig::default(), DocumentOrigin::new("text", ""));
/// session.mount(doc, root).unwrap();
/// let outcome = session
///     .on_selection_end([TextRange::within(text, 4, 9)], &mut Labels)
///     .unwrap();
///
/// assert!(outcome.region.is_some());
/// assert_eq!(session.to_records().count(), 1);
/// ```
#[derive(Debug)]
pub struct Session {
    config: HighlightConfig,
    anchorer: RangeAnchorer,
    renderer: HighlightRenderer,
    store: RegionStore,
    origin: DocumentOrigin,
    mounted: Option<Mounted>,
    selected: Option<RegionId>,
}

impl Session {
    pub fn new(config: HighlightConfig, origin: DocumentOrigin) -> Self {
        let anchorer = RangeAnchorer::new(config.marker_class.clone())
            .with_word_snapping(config.adjust_selection);
        let renderer = HighlightRenderer::new(config.marker_class.clone());
        Self {
            config,
            anchorer,
            renderer,
            store: RegionStore::new(),
            origin,
            mounted: None,
            selected: None,
        }
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    pub fn regions(&self) -> &RegionStore {
        &self.store
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.store.get(id)
    }

    pub fn document(&self) -> Option<&Document> {
        self.mounted.as_ref().map(|m| &m.doc)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.mounted.as_ref().map(|m| m.root)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn selected(&self) -> Option<RegionId> {
        self.selected
    }

    /// Take ownership of a rendered document. A previously mounted document
    /// is unmounted first.
    pub fn mount(&mut self, doc: Document, root: NodeId) -> Result<(), SessionError> {
        if !doc.is_element(root) {
            return Err(DomError::NotElement(root).into());
        }
        if self.mounted.is_some() {
            self.unmount();
        }
        log::info!("Mounted document with {} nodes", doc.node_count());
        self.mounted = Some(Mounted { doc, root });
        Ok(())
    }

    /// Capture the user's selection and turn its first accepted range into a
    /// highlighted region carrying the active label states.
    pub fn on_selection_end<I>(
        &mut self,
        ranges: I,
        labels: &mut dyn LabelStateSource,
    ) -> Result<SelectionOutcome, SessionError>
    where
        I: IntoIterator<Item = TextRange>,
    {
        let mounted = self.mounted.as_mut().ok_or(SessionError::NotMounted)?;
        let mut outcome = SelectionOutcome::default();
        if !self.config.selection_enabled {
            return Ok(outcome);
        }

        let mut accepted = None;
        for captured in self.anchorer.capture(&mut mounted.doc, mounted.root, ranges) {
            match captured {
                Captured::Anchored { anchor, range } => {
                    if accepted.is_none() {
                        accepted = Some((anchor, range));
                    }
                }
                Captured::Rejected(range) => outcome.rejected.push(range),
            }
        }

        let Some((anchor, range)) = accepted else {
            return Ok(outcome);
        };

        let states = labels.active_states();
        if states.is_empty() && self.config.require_active_labels {
            log::debug!("No active labels, selection left unannotated");
            return Ok(outcome);
        }

        let text = mounted.doc.range_text(&range);
        let mut region = Region::new(anchor, text, states);
        let color = region_color(&region, labels);
        region.set_color(color);

        let style = marker_style(color, self.config.resting_opacity);
        let owner = region.id.to_string();
        let handle = self
            .renderer
            .render(&mut mounted.doc, &range, &owner, &style)?;
        region.bind(handle);

        let id = self.store.add(region)?;
        labels.unselect_all();
        log::debug!("Created region {id}");

        outcome.region = Some(id);
        Ok(outcome)
    }

    /// Create the logical side of a persisted record. No tree is touched;
    /// call [`Session::bind_all`] once a document is mounted.
    pub fn create_pending(
        &mut self,
        record: &RegionRecord,
        control: &ControlDescriptor,
        delegate: &mut dyn RecordDelegate,
    ) -> Result<RestoreOutcome, SessionError> {
        Ok(restore_record(&mut self.store, record, control, delegate)?)
    }

    /// Restore a JSON batch of records. Each record succeeds or fails on its
    /// own; the outer error only covers input that is not a record array.
    pub fn restore_json(
        &mut self,
        json: &str,
        delegate: &mut dyn RecordDelegate,
    ) -> Result<Vec<Result<RestoreOutcome, SessionError>>, SessionError> {
        let mut outcomes = Vec::new();
        for record in records_from_json(json)? {
            let outcome = match record {
                Ok(record) => {
                    let control = ControlDescriptor::of(&record);
                    self.create_pending(&record, &control, delegate)
                }
                Err(e) => Err(e.into()),
            };
            if let Err(e) = &outcome {
                log::warn!("Skipping record: {e}");
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Resolve and render every unbound region in store order.
    pub fn bind_all(&mut self, labels: &dyn LabelStateSource) -> Result<BindReport, SessionError> {
        let mounted = self.mounted.as_mut().ok_or(SessionError::NotMounted)?;
        let mut report = BindReport::default();

        for region in self.store.iter_mut().filter(|r| !r.is_bound()) {
            match bind_region(
                &self.anchorer,
                &self.renderer,
                mounted,
                region,
                labels,
                self.config.resting_opacity,
            ) {
                Ok(()) => report.bound.push(region.id),
                Err(e) => {
                    log::warn!("Region {} ({}) not bound: {e}", region.id, region.pid);
                    report.failed.push((region.id, e));
                }
            }
        }

        log::info!(
            "Bound {} regions, {} failed",
            report.bound.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Emphasize one region. Only one region is selected at a time.
    pub fn select_region(&mut self, id: RegionId) -> Result<(), SessionError> {
        if let Some(previous) = self.selected
            && previous != id
        {
            self.unselect_region(previous)?;
        }
        self.store
            .get_mut(id)
            .ok_or(SessionError::UnknownRegion(id))?
            .set_selected(true);
        self.selected = Some(id);
        self.apply_opacity(id, self.config.selected_opacity)
    }

    pub fn unselect_region(&mut self, id: RegionId) -> Result<(), SessionError> {
        self.store
            .get_mut(id)
            .ok_or(SessionError::UnknownRegion(id))?
            .set_selected(false);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.apply_opacity(id, self.config.resting_opacity)
    }

    /// Hover emphasis. Clearing it keeps a selected region emphasized.
    pub fn set_highlight(&mut self, id: RegionId, highlighted: bool) -> Result<(), SessionError> {
        let region = self
            .store
            .get_mut(id)
            .ok_or(SessionError::UnknownRegion(id))?;
        region.set_highlighted(highlighted);
        let selected = region.is_selected();

        if highlighted {
            self.apply_opacity(id, self.config.selected_opacity)
        } else if !selected {
            self.apply_opacity(id, self.config.resting_opacity)
        } else {
            Ok(())
        }
    }

    /// Unwrap a region's markers and drop it from the store. When the
    /// markers cannot be unwrapped the region stays, still bound to them.
    pub fn remove_region(&mut self, id: RegionId) -> Result<Region, SessionError> {
        let region = self.store.get(id).ok_or(SessionError::UnknownRegion(id))?;
        if let Some(mounted) = self.mounted.as_mut() {
            self.renderer.unwrap(&mut mounted.doc, region.markers())?;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        let mut region = self
            .store
            .remove(id)
            .ok_or(SessionError::UnknownRegion(id))?;
        region.release();
        Ok(region)
    }

    /// Unwrap every marker and hand the document back. Regions stay in the
    /// store, unbound, ready for the next mount.
    pub fn unmount(&mut self) -> Option<Document> {
        let mut mounted = self.mounted.take()?;
        for region in self.store.iter_mut() {
            let handle = region.release();
            region.set_selected(false);
            region.set_highlighted(false);
            if let Err(e) = self.renderer.unwrap(&mut mounted.doc, &handle) {
                log::warn!("Failed to unwrap markers of region {}: {e}", region.id);
            }
        }
        self.selected = None;
        log::info!("Unmounted document, {} regions released", self.store.len());
        Some(mounted.doc)
    }

    /// Persisted records for every region, in store order
    pub fn to_records(&self) -> impl Iterator<Item = RegionRecord> + '_ {
        to_records(&self.store, &self.origin)
    }

    fn apply_opacity(&mut self, id: RegionId, opacity: f32) -> Result<(), SessionError> {
        let region = self.store.get(id).ok_or(SessionError::UnknownRegion(id))?;
        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(());
        };
        let style = marker_style(region.color(), opacity);
        self.renderer
            .restyle(&mut mounted.doc, region.markers(), &style)?;
        Ok(())
    }
}

fn bind_region(
    anchorer: &RangeAnchorer,
    renderer: &HighlightRenderer,
    mounted: &mut Mounted,
    region: &mut Region,
    labels: &dyn LabelStateSource,
    opacity: f32,
) -> Result<(), BindError> {
    let resolved = anchorer.resolve(&mounted.doc, mounted.root, &region.anchor)?;
    let range = split_boundaries(&mut mounted.doc, resolved)?;

    let color = region_color(region, labels);
    let handle = renderer.render(
        &mut mounted.doc,
        &range,
        &region.id.to_string(),
        &marker_style(color, opacity),
    )?;

    region.text = mounted.doc.range_text(&range);
    region.set_color(color);
    region.bind(handle);
    Ok(())
}

/// Color of the region's first label state, if the taxonomy has one
fn region_color(region: &Region, labels: &dyn LabelStateSource) -> Option<Rgba> {
    let state = region.label_states.first()?;
    let css = labels.selected_color(state)?;
    match Rgba::parse(&css) {
        Ok(color) => Some(color),
        Err(e) => {
            log::warn!("Ignoring color of label {}: {e}", state.name);
            None
        }
    }
}

fn marker_style(color: Option<Rgba>, opacity: f32) -> MarkerStyle {
    MarkerStyle {
        background_color: color.map(|c| c.with_alpha(opacity)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Position;
    use crate::regions::{FlatKinds, LabelState};
    use pretty_assertions::assert_eq;

    struct Panel {
        active: Vec<LabelState>,
        resets: usize,
    }

    impl Panel {
        fn with(states: &[(&str, &str, &str)]) -> Self {
            Self {
                active: states
                    .iter()
                    .map(|(name, kind, value)| {
                        LabelState::new(*name, *kind, vec![value.to_string()])
                    })
                    .collect(),
                resets: 0,
            }
        }
    }

    impl LabelStateSource for Panel {
        fn active_states(&self) -> Vec<LabelState> {
            self.active.clone()
        }

        fn selected_color(&self, _: &LabelState) -> Option<String> {
            Some("#ff0000".to_string())
        }

        fn unselect_all(&mut self) {
            self.resets += 1;
        }
    }

    fn session_on(markup: &str) -> (Session, NodeId) {
        let doc = Document::parse_html(markup);
        let root = doc.first_element().unwrap();
        let mut session = Session::new(
            HighlightConfig::default(),
            DocumentOrigin::new("text", markup),
        );
        session.mount(doc, root).unwrap();
        (session, root)
    }

    fn first_text(session: &Session, root: NodeId) -> NodeId {
        session.document().unwrap().children(root)[0]
    }

    fn marker_styles(session: &Session, id: RegionId) -> Vec<String> {
        let doc = session.document().unwrap();
        session
            .region(id)
            .unwrap()
            .markers()
            .markers()
            .iter()
            .filter_map(|&m| doc.attr(m, "style").map(str::to_string))
            .collect()
    }

    #[test]
    fn selection_creates_highlighted_region() {
        let (mut session, root) = session_on("<div>The quick brown fox</div>");
        let text = first_text(&session, root);
        let mut panel = Panel::with(&[("tag", "labels", "Animal")]);

        let outcome = session
            .on_selection_end([TextRange::within(text, 5, 12)], &mut panel)
            .unwrap();

        let id = outcome.region.unwrap();
        let region = session.region(id).unwrap();
        assert_eq!(region.text, "uick br");
        assert!(region.is_bound());
        assert_eq!(panel.resets, 1);
        insta::assert_snapshot!(
            session.document().unwrap().inner_html(root).replace(&id.to_string(), "ID"),
            @r#"The q<span class="htx-highlight" data-region="ID" style="background-color: rgba(255, 0, 0, 0.3)">uick br</span>own fox"#
        );
    }

    #[test]
    fn selection_without_active_labels_creates_nothing() {
        let (mut session, root) = session_on("<div>The quick brown fox</div>");
        let text = first_text(&session, root);

        let outcome = session
            .on_selection_end([TextRange::within(text, 4, 9)], &mut Panel::with(&[]))
            .unwrap();

        assert_eq!(outcome, SelectionOutcome::default());
        assert!(session.regions().is_empty());
    }

    #[test]
    fn disabled_selection_is_ignored() {
        let doc = Document::parse_html("<div>abc</div>");
        let root = doc.first_element().unwrap();
        let text = doc.children(root)[0];
        let config = HighlightConfig {
            selection_enabled: false,
            ..HighlightConfig::default()
        };
        let mut session = Session::new(config, DocumentOrigin::default());
        session.mount(doc, root).unwrap();

        let mut panel = Panel::with(&[("t", "labels", "A")]);
        let outcome = session
            .on_selection_end([TextRange::within(text, 0, 2)], &mut panel)
            .unwrap();

        assert!(outcome.region.is_none());
        assert_eq!(session.document().unwrap().children(root), &[text]);
    }

    #[test]
    fn rejected_ranges_are_handed_back() {
        let doc = Document::parse_html("<p>outside</p><div>inside</div><p>after</p>");
        let root = doc.children(doc.top())[1];
        let outside = doc.children(doc.children(doc.top())[0])[0];
        let after = doc.children(doc.children(doc.top())[2])[0];
        let mut session = Session::new(HighlightConfig::default(), DocumentOrigin::default());
        session.mount(doc, root).unwrap();
        let miss = TextRange::new(Position::new(outside, 0), Position::new(after, 2));

        let outcome = session
            .on_selection_end([miss], &mut Panel::with(&[("t", "labels", "A")]))
            .unwrap();

        assert_eq!(outcome.region, None);
        assert_eq!(outcome.rejected, vec![miss]);
    }

    #[test]
    fn operations_before_mount_fail() {
        let mut session = Session::new(HighlightConfig::default(), DocumentOrigin::default());
        let mut panel = Panel::with(&[]);

        assert!(matches!(
            session.on_selection_end(Vec::new(), &mut panel),
            Err(SessionError::NotMounted)
        ));
        assert!(matches!(session.bind_all(&panel), Err(SessionError::NotMounted)));
    }

    #[test]
    fn selection_and_hover_change_opacity() {
        let (mut session, root) = session_on("<div>alpha beta gamma</div>");
        let text = first_text(&session, root);
        let mut panel = Panel::with(&[("tag", "labels", "A")]);
        let first = session
            .on_selection_end([TextRange::within(text, 0, 5)], &mut panel)
            .unwrap()
            .region
            .unwrap();
        let text = session.document().unwrap().children(root)[1];
        let second = session
            .on_selection_end([TextRange::within(text, 1, 5)], &mut panel)
            .unwrap()
            .region
            .unwrap();

        session.select_region(first).unwrap();
        assert_eq!(marker_styles(&session, first), vec!["background-color: rgba(255, 0, 0, 0.8)"]);

        session.select_region(second).unwrap();
        assert_eq!(session.selected(), Some(second));
        assert_eq!(marker_styles(&session, first), vec!["background-color: rgba(255, 0, 0, 0.3)"]);

        session.set_highlight(second, false).unwrap();
        assert_eq!(marker_styles(&session, second), vec!["background-color: rgba(255, 0, 0, 0.8)"]);

        session.set_highlight(first, true).unwrap();
        assert_eq!(marker_styles(&session, first), vec!["background-color: rgba(255, 0, 0, 0.8)"]);
        session.set_highlight(first, false).unwrap();
        assert_eq!(marker_styles(&session, first), vec!["background-color: rgba(255, 0, 0, 0.3)"]);
    }

    #[test]
    fn remove_region_unwraps_its_markers() {
        let (mut session, root) = session_on("<div>The quick brown fox</div>");
        let text = first_text(&session, root);
        let mut panel = Panel::with(&[("t", "labels", "A")]);
        let id = session
            .on_selection_end([TextRange::within(text, 4, 9)], &mut panel)
            .unwrap()
            .region
            .unwrap();

        let removed = session.remove_region(id).unwrap();

        assert!(!removed.is_bound());
        assert!(session.regions().is_empty());
        let html = session.document().unwrap().inner_html(root);
        assert_eq!(html, "The quick brown fox");
        assert!(matches!(
            session.remove_region(id),
            Err(SessionError::UnknownRegion(_))
        ));
    }

    #[test]
    fn failed_removal_keeps_region_bound() {
        let (mut session, root) = session_on("<div>The quick brown fox</div>");
        let text = first_text(&session, root);
        let mut panel = Panel::with(&[("t", "labels", "A")]);
        let id = session
            .on_selection_end([TextRange::within(text, 4, 9)], &mut panel)
            .unwrap()
            .region
            .unwrap();
        let marker = session.region(id).unwrap().markers().markers()[0];
        let mounted = session.mounted.as_mut().unwrap();
        mounted.doc.remove_attr(marker, "class").unwrap();

        let err = session.remove_region(id).unwrap_err();

        assert!(matches!(
            err,
            SessionError::Highlight(HighlightError::NotAMarker(node)) if node == marker
        ));
        let region = session.region(id).unwrap();
        assert!(region.is_bound());
        assert_eq!(region.markers().markers(), &[marker]);
        assert_eq!(session.document().unwrap().children(marker).len(), 1);
    }

    #[test]
    fn unmount_releases_markers_and_keeps_regions() {
        let (mut session, root) = session_on("<div>The quick brown fox</div>");
        let text = first_text(&session, root);
        let mut panel = Panel::with(&[("t", "labels", "A")]);
        session
            .on_selection_end([TextRange::within(text, 4, 9)], &mut panel)
            .unwrap();

        let doc = session.unmount().unwrap();

        assert_eq!(doc.inner_html(root), "The quick brown fox");
        assert!(!session.is_mounted());
        assert_eq!(session.regions().len(), 1);
        assert!(session.regions().iter().all(|r| !r.is_bound()));
        assert!(session.unmount().is_none());
    }

    #[test]
    fn pending_regions_bind_after_mount() {
        let markup = "<div>The quick brown fox</div>";
        let mut session = Session::new(
            HighlightConfig::default(),
            DocumentOrigin::new("text", markup),
        );
        let json = r#"[{"id": "r1", "from_name": "tag", "to_name": "text", "source": "", "type": "labels",
            "value": {"startOffset": 4, "endOffset": 9, "start": "/0", "end": "/0", "labels": ["Animal"]}}]"#;

        let outcomes = session.restore_json(json, &mut FlatKinds::default()).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(session.regions().iter().all(|r| !r.is_bound()));

        let doc = Document::parse_html(markup);
        let root = doc.first_element().unwrap();
        session.mount(doc, root).unwrap();
        let report = session.bind_all(&Panel::with(&[])).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.bound.len(), 1);
        let region = session.regions().iter().next().unwrap();
        assert_eq!(region.text, "quick");
        assert_eq!(region.pid, "r1");
    }
}

use markup_regions_engine::anchoring::AnchorResolutionError;
use markup_regions_engine::{
    BindError, Document, DocumentOrigin, FlatKinds, HighlightConfig, LabelState, LabelStateSource,
    NodeId, Position, RecordError, RestoreOutcome, Session, SessionError, TextRange,
    records_from_json, records_to_json,
};
use pretty_assertions::assert_eq;

struct Panel(Vec<LabelState>);

impl LabelStateSource for Panel {
    fn active_states(&self) -> Vec<LabelState> {
        self.0.clone()
    }

    fn selected_color(&self, state: &LabelState) -> Option<String> {
        match state.kind.as_str() {
            "labels" => Some("orange".to_string()),
            _ => None,
        }
    }
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn article() -> (Document, NodeId) {
    let doc = Document::parse_html(&fixture("article.html"));
    let root = doc.first_element().unwrap();
    (doc, root)
}

fn session() -> Session {
    Session::new(
        HighlightConfig::default(),
        DocumentOrigin::new("text", "article.html"),
    )
}

/// Text node inside the `index`th child element of root
fn paragraph_text(doc: &Document, root: NodeId, index: usize) -> NodeId {
    doc.children(doc.children(root)[index])[0]
}

#[test]
fn restore_skips_only_the_stale_record() {
    let mut session = session();
    let mut delegate = FlatKinds::default();

    let outcomes = session
        .restore_json(&fixture("records.json"), &mut delegate)
        .unwrap();

    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(Result::is_ok));
    assert!(matches!(outcomes[3], Ok(RestoreOutcome::Delegated)));
    assert_eq!(delegate.restored().len(), 1);
    assert_eq!(session.regions().len(), 3);

    let (doc, root) = article();
    session.mount(doc, root).unwrap();
    let report = session.bind_all(&Panel(vec![])).unwrap();

    assert_eq!(report.bound.len(), 2);
    assert_eq!(report.failed.len(), 1);
    let (failed_id, error) = &report.failed[0];
    assert_eq!(session.region(*failed_id).unwrap().pid, "stale");
    assert!(matches!(
        error,
        BindError::Resolve(AnchorResolutionError::StepOutOfRange { index: 9, .. })
    ));

    let texts: Vec<(&str, &str)> = session
        .regions()
        .iter()
        .filter(|r| r.is_bound())
        .map(|r| (r.pid.as_str(), r.text.as_str()))
        .collect();
    assert_eq!(texts, vec![("fox", "quick"), ("second", "second")]);
}

#[test]
fn restored_regions_serialize_back_unchanged() {
    let json = fixture("records.json");
    let mut session = session();
    session.restore_json(&json, &mut FlatKinds::default()).unwrap();

    let original: Vec<_> = records_from_json(&json)
        .unwrap()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|r| r.kind != "textarea")
        .collect();
    let written: Vec<_> = session.to_records().collect();

    assert_eq!(written, original);
}

#[test]
fn capture_then_restore_in_fresh_render() {
    let (doc, root) = article();
    let first = paragraph_text(&doc, root, 3);
    let p2 = doc.children(root)[5];
    let link_text = doc.children(doc.children(p2)[3])[0];
    let selection = TextRange::new(Position::new(first, 35), Position::new(link_text, 1));
    let expected = doc.range_text(&selection);

    let mut live = session();
    live.mount(doc, root).unwrap();
    let mut panel = Panel(vec![LabelState::new("tag", "labels", vec!["Span".into()])]);
    live.on_selection_end([selection], &mut panel).unwrap();
    let json = records_to_json(&live.to_records().collect::<Vec<_>>()).unwrap();

    let mut restored = session();
    restored.restore_json(&json, &mut FlatKinds::default()).unwrap();
    let (doc, root) = article();
    restored.mount(doc, root).unwrap();
    let report = restored.bind_all(&panel).unwrap();

    assert!(report.is_complete());
    let region = restored.regions().iter().next().unwrap();
    assert_eq!(region.text, expected);
    assert_eq!(region.text, "lazy dog.\n  A second paragraph with a");
    assert_eq!(region.markers().len(), 5);
}

#[test]
fn every_label_state_gets_its_own_record() {
    let (doc, root) = article();
    let text = paragraph_text(&doc, root, 3);
    let mut session = session();
    session.mount(doc, root).unwrap();
    let mut panel = Panel(vec![
        LabelState::new("tag", "labels", vec!["Animal".into()]),
        LabelState::new("score", "rating", vec!["4".into()]),
    ]);

    session
        .on_selection_end([TextRange::within(text, 16, 19)], &mut panel)
        .unwrap();
    let records: Vec<_> = session.to_records().collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].value.start, records[1].value.start);
    assert_eq!(records[0].value.start_offset, 16);
    assert_eq!(records[1].value.end_offset, 19);
    assert_eq!(records[0].kind, "labels");
    assert_eq!(records[1].kind, "rating");
    assert_eq!(records[1].selected("rating"), vec!["4"]);
}

#[test]
fn overlapping_regions_are_removed_independently() {
    let (doc, root) = article();
    let text = paragraph_text(&doc, root, 3);
    let mut session = session();
    session.mount(doc, root).unwrap();
    let mut panel = Panel(vec![LabelState::new("tag", "labels", vec!["A".into()])]);

    let outer = session
        .on_selection_end([TextRange::within(text, 2, 10)], &mut panel)
        .unwrap()
        .region
        .unwrap();
    let inner_range = {
        let doc = session.document().unwrap();
        let marker = session.region(outer).unwrap().markers().markers()[0];
        let marked = doc.children(marker)[0];
        TextRange::within(marked, 3, 6)
    };
    let inner = session
        .on_selection_end([inner_range], &mut panel)
        .unwrap()
        .region
        .unwrap();
    assert_eq!(session.region(inner).unwrap().text, "uic");

    session.remove_region(inner).unwrap();

    let doc = session.document().unwrap();
    let outer_marker = session.region(outer).unwrap().markers().markers()[0];
    assert_eq!(doc.text_content(outer_marker), "e quick ");
    assert_eq!(
        doc.text_content(root),
        Document::parse_html(&fixture("article.html")).text_content(root)
    );
    assert!(!doc.to_html(root).contains(&inner.to_string()));
}

#[test]
fn malformed_record_is_reported_alone() {
    let json = r#"[
        {"id": "ok", "from_name": "tag", "to_name": "text", "source": "", "type": "labels",
         "value": {"startOffset": 0, "endOffset": 3, "start": "/3/0", "end": "/3/0"}},
        {"id": "broken", "from_name": "tag", "to_name": "text", "source": "", "type": "labels",
         "value": {"startOffset": 0, "start": "/3/0", "end": "/3/0"}}
    ]"#;
    let mut session = session();

    let outcomes = session.restore_json(json, &mut FlatKinds::default()).unwrap();

    assert!(outcomes[0].is_ok());
    assert!(matches!(
        &outcomes[1],
        Err(SessionError::Record(RecordError::Malformed { id, .. })) if id == "broken"
    ));
    assert_eq!(session.regions().len(), 1);
}

#[test]
fn markdown_documents_mount_like_html() {
    let doc = Document::from_markdown("Some *emphasised* words\n\nSecond paragraph\n");
    let root = doc.top();
    let emphasised = doc.children(doc.children(doc.children(root)[0])[1])[0];
    let mut session = session();
    session.mount(doc, root).unwrap();

    let outcome = session
        .on_selection_end(
            [TextRange::within(emphasised, 0, 10)],
            &mut Panel(vec![LabelState::new("tag", "labels", vec!["A".into()])]),
        )
        .unwrap();

    let record = session.to_records().next().unwrap();
    assert!(outcome.region.is_some());
    assert_eq!(record.value.start, "/0/1/0");
    assert_eq!(record.value.end_offset, 10);
}

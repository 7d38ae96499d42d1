//! End-to-end resolution tests
//!
//! Pointers evaluated against parsed documents, the subtree reader facade,
//! subtree navigation and `xml:base` tracking, all through the public API.

use rstest::{fixture, rstest};
use rustyxpointer::xpath::{self, SortDataType, SortOrder};
use rustyxpointer::{
    resolve, DocumentNavigator, DocumentSource, EventSource, PointerError, SliceReader, SubtreeNavigator,
    XPathNavigator, XPathNodeType, XPointerReader, XmlBaseReader, XmlDocument,
};
use std::sync::Arc;

const BOOK: &str = r#"<?xml version="1.0"?>
<!DOCTYPE book [ <!ATTLIST chapter key ID #IMPLIED> ]>
<book xmlns:ex="http://example.com">
  <chapter key="chap1"><title>Intro</title><para>Hello</para></chapter>
  <chapter key="chap2"><title>Body</title><ex:foo>Namespaced</ex:foo></chapter>
  <chapter><title>Appendix</title></chapter>
</book>"#;

#[fixture]
fn book() -> DocumentNavigator {
    DocumentNavigator::new(Arc::new(XmlDocument::parse(BOOK.as_bytes())))
}

fn first_value(nav: &DocumentNavigator, pointer: &str) -> String {
    let nodes = resolve(nav, pointer).unwrap();
    nodes.current().map(|n| n.value()).unwrap_or_default()
}

#[rstest]
#[case("chap2", "BodyNamespaced")]
#[case("element(chap1/2)", "Hello")]
#[case("element(/1/3/1)", "Appendix")]
#[case("xpath1(//chapter[title='Body']/title)", "Body")]
#[case("xmlns(ex=http://example.com)xpointer(//ex:foo)", "Namespaced")]
#[case("element(missing)element(/1/1/1)", "Intro")]
fn test_pointer_values(book: DocumentNavigator, #[case] pointer: &str, #[case] expected: &str) {
    assert_eq!(first_value(&book, pointer), expected);
}

#[test]
fn test_xmlns_binding_enables_prefixed_expression() {
    let doc = r#"<ex:foo xmlns:ex="http://example.com">found</ex:foo>"#;
    let nav = DocumentNavigator::new(Arc::new(XmlDocument::parse(doc.as_bytes())));
    assert_eq!(first_value(&nav, "xmlns(ex=http://example.com)xpointer(ex:foo)"), "found");
    assert!(matches!(
        resolve(&nav, "xpointer(ex:foo)"),
        Err(PointerError::NoSubresources { .. })
    ));
}

#[rstest]
#[case("missing", "missing")]
#[case("element(missing)", "element(missing)")]
#[case("xpointer(ex:foo)", "xpointer(ex:foo)")]
#[case("xpointer(//ex:foo)", "xpointer(//ex:foo)")]
#[case("xpath1(/book[)", "xpath1(/book[)")]
#[case("unknown(//chapter)", "unknown(//chapter)")]
fn test_no_subresources(book: DocumentNavigator, #[case] pointer: &str, #[case] reported: &str) {
    match resolve(&book, pointer) {
        Err(err @ PointerError::NoSubresources { .. }) => {
            assert!(err.to_string().contains(reported), "{}", err);
        }
        other => panic!("expected no-subresources for {}, got {:?}", pointer, other),
    }
}

#[rstest]
fn test_matches_are_in_document_order(book: DocumentNavigator) {
    let mut nodes = resolve(&book, "xpath1(//title)").unwrap();
    let mut titles = Vec::new();
    loop {
        titles.extend(nodes.current().map(|n| n.value()));
        if !nodes.move_next() {
            break;
        }
    }
    assert_eq!(titles, vec!["Intro", "Body", "Appendix"]);
}

#[rstest]
fn test_cached_handles_keep_independent_sort_state(book: DocumentNavigator) {
    let mut sorted = xpath::compile("//chapter/title").unwrap();
    let plain = xpath::compile("//chapter/title").unwrap();
    assert!(sorted.shares_compiled_form(&plain));

    sorted.add_sort(".", SortOrder::Ascending, SortDataType::Text).unwrap();
    let env = xpath::DynamicContext::new();
    let values = |mut it: rustyxpointer::NodeIterator| {
        let mut out = Vec::new();
        while it.move_next() {
            out.extend(it.current().map(|n| n.value()));
        }
        out
    };
    assert_eq!(values(sorted.select(&book, &env).unwrap()), vec!["Appendix", "Body", "Intro"]);
    assert_eq!(values(plain.select(&book, &env).unwrap()), vec!["Intro", "Body", "Appendix"]);
    assert!(plain.sort_keys().is_empty());
}

#[test]
fn test_subtree_navigator_modes() {
    let doc = "<book><chapter xml:id=\"c1\">Intro</chapter><chapter xml:id=\"c2\"/><chapter>Appendix</chapter></book>";
    let nav = DocumentNavigator::new(Arc::new(XmlDocument::parse(doc.as_bytes())));
    let chapter = resolve(&nav, "c2").unwrap().current().unwrap();

    let mut scoped = SubtreeNavigator::new(chapter.clone());
    assert!(!scoped.move_to_parent());
    assert!(scoped.move_to_first_child());
    assert_eq!(scoped.name(), "chapter");
    assert!(!scoped.move_to_next());
    assert!(!scoped.move_to_previous());
    assert!(scoped.move_to_parent());
    assert_eq!(scoped.node_type(), XPathNodeType::Root);

    let mut fragment = SubtreeNavigator::fragment(chapter);
    assert!(fragment.move_to_first_child());
    assert!(fragment.move_to_next());
    assert_eq!(fragment.value(), "Appendix");
    assert!(fragment.move_to_previous());
    assert!(fragment.move_to_previous());
    assert_eq!(fragment.value(), "Intro");
    assert!(fragment.move_to_parent());
    assert!(!fragment.move_to_parent());
}

#[test]
fn test_base_uri_tracking_by_depth() {
    let xml = br#"<r><d1 xml:base="http://example.com/one/"><d2><d3 xml:base="three/"><d4/></d3><d3b/></d2></d1></r>"#;
    let mut reader = XmlBaseReader::new(SliceReader::new(xml));
    let mut seen = Vec::new();
    while let Some(event) = reader.next_event() {
        if let Some(elem) = event.as_start_element() {
            let name = elem.name_str().unwrap_or_default().to_string();
            seen.push((name, reader.base_uri().map(str::to_string)));
        }
        if event.as_end_element().map_or(false, |e| e.name_str() == Some("d3")) {
            assert_eq!(reader.base_uri(), Some("http://example.com/one/"));
        }
    }
    let base = |name: &str| {
        seen.iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, b)| b.clone())
    };
    assert_eq!(base("r"), None);
    assert_eq!(base("d4").as_deref(), Some("http://example.com/one/three/"));
    assert_eq!(base("d3b").as_deref(), Some("http://example.com/one/"));
}

#[test]
fn test_reader_streams_only_the_match() {
    let source = DocumentSource::content("http://example.com/book.xml", BOOK);
    let mut reader = XPointerReader::new(source, "element(chap1/2)").unwrap();
    assert_eq!(EventSource::base_uri(&reader), Some("http://example.com/book.xml"));
    assert_eq!(reader.read_to_string(), "<para xmlns:ex=\"http://example.com\">Hello</para>");
    assert!(reader.next_event().is_none());
}

#[rstest]
#[case::document_node("xpath1(/)", "<r><a>x</a><b c=\"y\"/></r>")]
#[case::root_element("element(/1)", "<r><a>x</a><b c=\"y\"/></r>")]
#[case::text_node("xpath1(//a/text())", "x")]
#[case::attribute("xpath1(//@c)", "y")]
#[case::mixed("xpath1(//a | //@c)", "<a>x</a>y")]
fn test_reader_streams_any_node_kind(#[case] pointer: &str, #[case] expected: &str) {
    let source = DocumentSource::content("http://example.com/r.xml", "<r><a>x</a><b c=\"y\"/></r>");
    let mut reader = XPointerReader::new(source, pointer).unwrap();
    assert_eq!(reader.read_to_string(), expected);
    assert!(reader.next_event().is_none());
}

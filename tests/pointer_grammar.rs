//! Grammar-level tests for XPointer compilation
//!
//! Table-driven cases over the public `Pointer::compile` API: shorthand
//! detection, element() translation, escaping and syntax errors.

use rstest::rstest;
use rustyxpointer::{Pointer, PointerError, PointerKind, PointerPart};

fn element_xpath(text: &str) -> String {
    match Pointer::compile(text).unwrap().parts() {
        [PointerPart::Element { xpath }] => xpath.clone(),
        other => panic!("expected one element() part, got {:?}", other),
    }
}

#[rstest]
#[case("foo", true)]
#[case("_a.b-c", true)]
#[case("foo(bar)", false)]
#[case("element(/1)", false)]
#[case("unknown(anything at all)", false)]
fn test_shorthand_disambiguation(#[case] text: &str, #[case] shorthand: bool) {
    let pointer = Pointer::compile(text).unwrap();
    assert_eq!(pointer.is_shorthand(), shorthand);
    assert_eq!(pointer.text(), text);
}

#[rstest]
#[case("element(/1/2)", "/*[1]/*[2]")]
#[case("element(chap1/2)", "id('chap1')/*[2]")]
#[case("element(chap1)", "id('chap1')")]
#[case("element(/1/10/003)", "/*[1]/*[10]/*[3]")]
fn test_element_translation(#[case] text: &str, #[case] xpath: &str) {
    assert_eq!(element_xpath(text), xpath);
}

#[rstest]
#[case::empty("")]
#[case::empty_element("element()")]
#[case::zero_index("element(/1/0)")]
#[case::dangling_slash("element(/1/)")]
#[case::bad_escape("xpointer(^x)")]
#[case::trailing_caret("xpointer(a^")]
#[case::unbalanced("xpointer(//a[f(1])")]
#[case::xmlns_without_equals("xmlns(ex http://e)")]
#[case::shorthand_with_suffix("foo bar")]
#[case::junk_between_parts("element(/1) , element(/2)")]
fn test_syntax_errors(#[case] text: &str) {
    match Pointer::compile(text) {
        Err(PointerError::Syntax { pointer, .. }) => assert_eq!(pointer, text),
        other => panic!("expected syntax error for {:?}, got {:?}", text, other),
    }
}

#[rstest]
#[case("xpointer(a^^b)", "a^b")]
#[case("xpointer(f^(x^))", "f(x)")]
#[case("xpointer(//a[g(1)])", "//a[g(1)]")]
#[case("xpath1(  spaced  )", "  spaced  ")]
fn test_escaped_data(#[case] text: &str, #[case] expr: &str) {
    let parts = Pointer::compile(text).unwrap().parts().to_vec();
    let found = match parts.as_slice() {
        [PointerPart::XPointer { expr }] | [PointerPart::XPath1 { expr }] => expr.clone(),
        other => panic!("unexpected parts {:?}", other),
    };
    assert_eq!(found, expr);
}

#[test]
fn test_scheme_sequence_keeps_known_parts_in_order() {
    let pointer = Pointer::compile("xmlns(a=urn:a) a:custom(x) xmlns(b = urn:b)other(y)xpointer(//a:x)").unwrap();
    assert_eq!(
        pointer.kind(),
        &PointerKind::SchemeBased {
            parts: vec![
                PointerPart::Xmlns {
                    prefix: "a".to_string(),
                    uri: "urn:a".to_string()
                },
                PointerPart::Xmlns {
                    prefix: "b".to_string(),
                    uri: "urn:b".to_string()
                },
                PointerPart::XPointer {
                    expr: "//a:x".to_string()
                },
            ]
        }
    );
}

#[test]
fn test_compile_is_deterministic() {
    let text = "xmlns(ex=http://example.com)xpointer(ex:foo)element(/1)";
    let first = Pointer::compile(text).unwrap();
    for _ in 0..3 {
        assert_eq!(Pointer::compile(text).unwrap(), first);
    }
    assert_eq!(text.parse::<Pointer>().unwrap(), first);
}

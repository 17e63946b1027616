//! Integration tests for required, optional and bounded content

use super::test_utils::{Dom, ROOT};
use pagemodel::{ContentClass, ContentDsl, ContentError, ContentOwner, Template};
use std::sync::Arc;

struct ResultsPage;
struct Unrelated;

impl ContentClass for Unrelated {
    fn define(_content: &mut ContentDsl) {}
}

impl ContentClass for ResultsPage {
    fn define(content: &mut ContentDsl) {
        content
            .item("heading", Template::find("h1"))
            .item("error", Template::find(".error"))
            .item("notice", Template::find(".notice").required(false))
            .item("results", Template::repeating("li"))
            .item("atLeastFour", Template::repeating("li").min(4))
            .item("atMostTwo", Template::repeating("li").max(2))
            .item("between", Template::find("li").min(1).max(5))
            .item("emptyList", Template::repeating("li.missing").min(2).required(false));
    }
}

fn document() -> Arc<Dom> {
    let dom = Dom::new();
    dom.add(ROOT, "h1");
    let list = dom.add(ROOT, "ul");
    for _ in 0..3 {
        dom.add(list, "li");
    }
    dom
}

#[test]
fn test_required_content_absent_is_distinct_error() {
    let session = document().session();
    let page = session.page::<ResultsPage>().unwrap();

    let err = page.content("error").unwrap_err();
    assert!(matches!(
        err,
        ContentError::RequiredAbsent { class: "ResultsPage", ref name } if name == "error"
    ));
    assert!(!page.is_cached("error"));
}

#[test]
fn test_optional_content_resolves_to_absent_marker() {
    let session = document().session();
    let page = session.page::<ResultsPage>().unwrap();

    assert!(page.content("notice").unwrap().is_absent());
    assert!(page.optional("notice").unwrap().is_none());
    assert!(page.optional("heading").unwrap().is_some());

    let Err(err) = page.handle("notice") else {
        panic!("absent content should not convert to a handle");
    };
    assert!(matches!(
        err,
        ContentError::TypeMismatch { found: "absent", .. }
    ));
}

#[test]
fn test_minimum_match_count() {
    let session = document().session();
    let page = session.page::<ResultsPage>().unwrap();

    let err = page.content("atLeastFour").unwrap_err();
    assert!(matches!(
        err,
        ContentError::CountOutOfBounds { count: 3, min: 4, max: None, .. }
    ));
    assert!(err.to_string().contains("atLeastFour"));
}

#[test]
fn test_maximum_match_count() {
    let session = document().session();
    let page = session.page::<ResultsPage>().unwrap();

    let err = page.content("atMostTwo").unwrap_err();
    assert!(matches!(
        err,
        ContentError::CountOutOfBounds { count: 3, min: 1, max: Some(2), .. }
    ));
}

#[test]
fn test_count_within_bounds() {
    let session = document().session();
    let page = session.page::<ResultsPage>().unwrap();

    assert_eq!(page.handle("between").unwrap().size().unwrap(), 3);
    assert_eq!(page.handles("results").unwrap().len(), 3);
}

#[test]
fn test_empty_optional_content_skips_bounds() {
    let session = document().session();
    let page = session.page::<ResultsPage>().unwrap();

    assert!(page.content("emptyList").unwrap().is_absent());
}

#[test]
fn test_typed_accessor_mismatch() {
    let session = document().session();
    let page = session.page::<ResultsPage>().unwrap();

    let err = page.module::<Unrelated>("heading").unwrap_err();
    assert!(matches!(
        err,
        ContentError::TypeMismatch { class: "ResultsPage", expected: "Unrelated", found: "a handle", .. }
    ));

    let Err(err) = page.handles("heading") else {
        panic!("a single handle should not convert to a list");
    };
    assert!(matches!(err, ContentError::TypeMismatch { .. }));
}

//! Integration tests for content inheritance between page classes

use super::test_utils::{count_matching, Dom, ROOT};
use pagemodel::error::DefinitionError;
use pagemodel::{ClassInfo, ContentClass, ContentDsl, ContentError, ContentOwner, Template};

struct BasePage;
struct ChildPage;
struct GrandchildPage;
struct AmbiguousPage;

impl ContentClass for BasePage {
    fn define(content: &mut ContentDsl) {
        content
            .item("header", Template::find("header"))
            .item("title", Template::find("h1"));
    }
}

impl ContentClass for ChildPage {
    fn define(content: &mut ContentDsl) {
        content
            .item("title", Template::find("h2"))
            .item("footer", Template::find("footer"));
    }

    fn extends() -> Option<ClassInfo> {
        Some(ClassInfo::of::<BasePage>())
    }
}

impl ContentClass for GrandchildPage {
    fn define(content: &mut ContentDsl) {
        content.item("header", Template::find("nav"));
    }

    fn extends() -> Option<ClassInfo> {
        Some(ClassInfo::of::<ChildPage>())
    }
}

impl ContentClass for AmbiguousPage {
    fn define(content: &mut ContentDsl) {
        content
            .item("title", Template::find("h1"))
            .item("title", Template::find("h2"));
    }
}

fn document() -> std::sync::Arc<Dom> {
    let dom = Dom::new();
    dom.add(ROOT, "header");
    dom.add(ROOT, "nav");
    dom.add(ROOT, "h1");
    dom.add(ROOT, "h2");
    dom.add(ROOT, "footer");
    dom
}

#[test]
fn test_subclass_definition_replaces_superclass() {
    let session = document().session();

    let child = session.page::<ChildPage>().unwrap();
    let title = child.handle("title").unwrap();
    assert_eq!(count_matching(&title, "h2"), 1);
    assert_eq!(count_matching(&title, "h1"), 0);

    let base = session.page::<BasePage>().unwrap();
    assert_eq!(count_matching(&base.handle("title").unwrap(), "h1"), 1);
}

#[test]
fn test_inherited_content_is_available_unchanged() {
    let session = document().session();
    let child = session.page::<ChildPage>().unwrap();

    assert_eq!(count_matching(&child.handle("header").unwrap(), "header"), 1);
    assert_eq!(count_matching(&child.handle("footer").unwrap(), "footer"), 1);
}

#[test]
fn test_most_derived_definition_wins_across_levels() {
    let session = document().session();
    let page = session.page::<GrandchildPage>().unwrap();

    assert_eq!(count_matching(&page.handle("header").unwrap(), "nav"), 1);
    assert_eq!(count_matching(&page.handle("title").unwrap(), "h2"), 1);

    let definition = page.instance().definition();
    let names: Vec<&str> = definition.content().names().collect();
    assert_eq!(names, ["header", "title", "footer"]);
    assert_eq!(
        definition.content().get("title").unwrap().declared_by(),
        "ChildPage"
    );
}

#[test]
fn test_duplicate_declaration_fails_when_page_opens() {
    let session = document().session();
    let err = session.page::<AmbiguousPage>().unwrap_err();
    assert!(matches!(
        err,
        ContentError::Definition(DefinitionError::DuplicateContent { class: "AmbiguousPage", ref name })
            if name == "title"
    ));
}

#[test]
fn test_unknown_content_names_class() {
    let session = document().session();
    let page = session.page::<ChildPage>().unwrap();
    let err = page.content("sidebar").unwrap_err();
    assert!(matches!(
        err,
        ContentError::UnknownContent { class: "ChildPage", ref name } if name == "sidebar"
    ));
}

struct LenientPage;
struct StrictPage;

impl ContentClass for LenientPage {
    fn define(content: &mut ContentDsl) {
        content
            .item("banner", Template::find("#banner").required(false))
            .item("status", Template::find("h1").cache(false));
    }
}

impl ContentClass for StrictPage {
    fn define(content: &mut ContentDsl) {
        content
            .item("banner", Template::find("#banner"))
            .item("status", Template::find("h1"));
    }

    fn extends() -> Option<ClassInfo> {
        Some(ClassInfo::of::<LenientPage>())
    }
}

#[test]
fn test_redeclared_content_does_not_inherit_options() {
    let session = document().session();

    let lenient = session.page::<LenientPage>().unwrap();
    assert!(lenient.content("banner").unwrap().is_absent());
    lenient.content("status").unwrap();
    assert!(!lenient.is_cached("status"));

    let strict = session.page::<StrictPage>().unwrap();
    let err = strict.content("banner").unwrap_err();
    assert!(matches!(
        err,
        ContentError::RequiredAbsent { class: "StrictPage", ref name } if name == "banner"
    ));

    let first = strict.content("status").unwrap();
    assert!(strict.is_cached("status"));
    assert!(first.same_as(&strict.content("status").unwrap()));
}

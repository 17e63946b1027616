//! Integration tests for per-instance content caching

use super::test_utils::{Dom, ROOT};
use pagemodel::{args, Arg, ContentClass, ContentContext, ContentDsl, ContentOwner, Template};
use std::sync::atomic::{AtomicUsize, Ordering};

static CACHED_CALLS: AtomicUsize = AtomicUsize::new(0);
static UNCACHED_CALLS: AtomicUsize = AtomicUsize::new(0);

struct CatalogPage;

fn nth_item(ctx: &ContentContext<'_>) -> Result<pagemodel::NavigatorRef, pagemodel::ContentError> {
    let index = ctx.args().get(0).and_then(Arg::as_index).unwrap_or(0);
    let items = ctx.find("li")?;
    ctx.query(items.at(index))
}

impl ContentClass for CatalogPage {
    fn define(content: &mut ContentDsl) {
        content
            .item(
                "heading",
                Template::query(|ctx| {
                    CACHED_CALLS.fetch_add(1, Ordering::SeqCst);
                    ctx.find("h1")
                }),
            )
            .item(
                "live",
                Template::query(|ctx| {
                    UNCACHED_CALLS.fetch_add(1, Ordering::SeqCst);
                    ctx.find("h1")
                })
                .cache(false),
            )
            .item("item", Template::query(nth_item))
            .item("banner", Template::find("#banner").required(false));
    }
}

fn document() -> std::sync::Arc<Dom> {
    let dom = Dom::new();
    dom.add(ROOT, "h1");
    let list = dom.add(ROOT, "ul");
    dom.add(list, "li#first");
    dom.add(list, "li#second");
    dom
}

#[test]
fn test_cached_content_is_identity_stable() {
    let session = document().session();
    let page = session.page::<CatalogPage>().unwrap();

    assert!(!page.is_cached("heading"));
    let before = CACHED_CALLS.load(Ordering::SeqCst);
    let first = page.content("heading").unwrap();
    let second = page.content("heading").unwrap();

    assert!(first.same_as(&second));
    assert!(page.is_cached("heading"));
    assert_eq!(CACHED_CALLS.load(Ordering::SeqCst) - before, 1);
}

#[test]
fn test_uncached_content_reinvokes_factory() {
    let session = document().session();
    let page = session.page::<CatalogPage>().unwrap();

    let before = UNCACHED_CALLS.load(Ordering::SeqCst);
    let first = page.content("live").unwrap();
    let second = page.content("live").unwrap();

    assert!(!first.same_as(&second));
    assert!(!page.is_cached("live"));
    assert_eq!(UNCACHED_CALLS.load(Ordering::SeqCst) - before, 2);
}

#[test]
fn test_lookups_with_arguments_bypass_cache() {
    let dom = document();
    let page = dom.session().page::<CatalogPage>().unwrap();

    let second = page.content_with("item", args![1]).unwrap();
    let queries = dom.queries();
    let again = page.content_with("item", args![1]).unwrap();

    assert!(dom.queries() > queries);
    assert!(!second.same_as(&again));
    assert!(!page.is_cached("item"));

    let handle = second.as_navigator().unwrap();
    assert_eq!(handle.filter("#second").unwrap().size().unwrap(), 1);

    // the argument-free lookup is cached independently
    let first = page.content("item").unwrap();
    assert!(page.is_cached("item"));
    assert_eq!(
        first
            .as_navigator()
            .unwrap()
            .filter("#first")
            .unwrap()
            .size()
            .unwrap(),
        1
    );
}

#[test]
fn test_absent_marker_is_cached() {
    let dom = document();
    let page = dom.session().page::<CatalogPage>().unwrap();

    assert!(page.content("banner").unwrap().is_absent());
    assert!(page.is_cached("banner"));

    // later document changes are not observed through the cache
    dom.add(ROOT, "div#banner");
    assert!(page.content("banner").unwrap().is_absent());
}

#[test]
fn test_caches_are_per_instance() {
    let session = document().session();
    let first = session.page::<CatalogPage>().unwrap();
    let second = session.page::<CatalogPage>().unwrap();

    let a = first.content("item").unwrap();
    let b = second.content("item").unwrap();
    assert!(!a.same_as(&b));
    assert!(first.is_cached("item"));
    assert!(second.is_cached("item"));
}

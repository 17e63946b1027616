//! Integration tests for repeating content and per-element modules

use super::test_utils::{count_matching, Dom, ROOT};
use pagemodel::{Arg, ContentClass, ContentDsl, ContentOwner, Navigator, Params, Template};
use std::sync::Arc;

struct CartPage;
struct CartRow;

impl ContentClass for CartRow {
    fn define(content: &mut ContentDsl) {
        content
            .item("name", Template::find("td.name"))
            .item("price", Template::find("td.price"))
            .item(
                "position",
                Template::value(|ctx| {
                    let index = ctx.param("index")?.as_index().unwrap_or(0);
                    let cells = ctx.find("td")?;
                    Ok(pagemodel::Content::Handle(ctx.query(cells.at(index % 2))?))
                }),
            );
    }
}

impl ContentClass for CartPage {
    fn define(content: &mut ContentDsl) {
        content
            .item(
                "rows",
                Template::repeating_query(|ctx| {
                    let rows = ctx.find("#cart tr")?;
                    ctx.query(rows.filter(":not(.header)"))
                })
                .each_module::<CartRow>()
                .indexed(),
            )
            .item(
                "labelled",
                Template::repeating("#cart tr.row")
                    .each_module::<CartRow>()
                    .params_indexed(|_, index| Ok(Params::new().with("label", format!("row-{index}")))),
            )
            .item("names", Template::repeating("#cart td.name"))
            .item("coupons", Template::repeating("#cart tr.coupon").required(false));
    }
}

/// `#cart` with a header row and three data rows
fn document() -> Arc<Dom> {
    let dom = Dom::new();
    let cart = dom.add(ROOT, "table#cart");
    let header = dom.add(cart, "tr.header");
    dom.add(header, "td.name#name-header");
    for index in 0..3 {
        let row = dom.add(cart, &format!("tr.row#row-{index}"));
        dom.add(row, &format!("td.name#name-{index}"));
        dom.add(row, &format!("td.price#price-{index}"));
    }
    dom
}

#[test]
fn test_cart_rows_are_independently_based_modules() {
    let session = document().session();
    let page = session.page::<CartPage>().unwrap();

    let rows = page.modules::<CartRow>("rows").unwrap();
    assert_eq!(rows.len(), 3);

    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row.size().unwrap(), 1);
        assert_eq!(count_matching(row.instance().base(), &format!("#row-{index}")), 1);

        let name = row.handle("name").unwrap();
        assert_eq!(name.size().unwrap(), 1);
        assert_eq!(count_matching(&name, &format!("#name-{index}")), 1);
    }
}

#[test]
fn test_header_row_is_excluded() {
    let session = document().session();
    let page = session.page::<CartPage>().unwrap();

    let rows = page.modules::<CartRow>("rows").unwrap();
    assert!(rows
        .iter()
        .all(|row| count_matching(row.instance().base(), ".header") == 0));
}

#[test]
fn test_rows_receive_their_index() {
    let session = document().session();
    let page = session.page::<CartPage>().unwrap();

    let rows = page.modules::<CartRow>("rows").unwrap();
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row.params().get("index"), Some(&Arg::Int(index as i64)));
    }

    let position = rows[1].handle("position").unwrap();
    assert_eq!(count_matching(&position, "#price-1"), 1);

    let labelled = page.modules::<CartRow>("labelled").unwrap();
    assert_eq!(
        labelled[2].params().get("label").and_then(Arg::as_str),
        Some("row-2")
    );
}

#[test]
fn test_row_caches_are_independent() {
    let session = document().session();
    let page = session.page::<CartPage>().unwrap();
    let rows = page.modules::<CartRow>("rows").unwrap();

    rows[0].content("name").unwrap();
    assert!(rows[0].is_cached("name"));
    assert!(!rows[1].is_cached("name"));
    assert!(!rows[2].is_cached("name"));

    let first = rows[0].content("name").unwrap();
    let second = rows[1].content("name").unwrap();
    assert!(!first.same_as(&second));
}

#[test]
fn test_repeating_content_returns_same_instances_when_cached() {
    let session = document().session();
    let page = session.page::<CartPage>().unwrap();

    let first = page.content("rows").unwrap();
    let second = page.content("rows").unwrap();
    assert!(first.same_as(&second));

    let items = first.as_list().unwrap();
    assert!(!items[0].same_as(&items[1]));
}

#[test]
fn test_repeating_raw_handles() {
    let session = document().session();
    let page = session.page::<CartPage>().unwrap();

    let names = page.handles("names").unwrap();
    assert_eq!(names.len(), 4);
    assert!(names.iter().all(|name| name.size().unwrap() == 1));
    assert_eq!(count_matching(&names[0], "#name-header"), 1);
    assert_eq!(count_matching(&names[3], "#name-2"), 1);
}

#[test]
fn test_optional_repeating_content_with_no_matches() {
    let session = document().session();
    let page = session.page::<CartPage>().unwrap();

    assert!(page.content("coupons").unwrap().is_absent());
    assert!(page.handles("coupons").unwrap().is_empty());
    assert!(page.optional("coupons").unwrap().is_none());
}

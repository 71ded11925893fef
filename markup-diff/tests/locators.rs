//! Locators for nodes, and resolving them back.

use std::path::PathBuf;

use markup_diff::node::same_node;
use markup_diff::{
    locate, parse_file, parse_str, resolve, select, to_markup, DfsTreeIterator, NodeRef,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Elements named `tag`, in document order.
fn elements(root: &NodeRef, tag: &str) -> Vec<NodeRef> {
    DfsTreeIterator::new(root.clone())
        .filter(|node| node.borrow().name() == Some(tag))
        .collect()
}

fn path_of(markup: &str, tag: &str) -> String {
    let root = parse_str(markup).unwrap();
    let node = elements(&root, tag).remove(0);
    locate(&node).unwrap().to_string()
}

#[test]
fn test_id() {
    assert_eq!(path_of(r#"<div id="hello"></div>"#, "div"), ":root > div#hello");
}

#[test]
fn test_classes() {
    assert_eq!(
        path_of(r#"<div class="button disabled"></div>"#, "div"),
        ":root > div.button.disabled"
    );
}

#[test]
fn test_plain_tag() {
    assert_eq!(path_of("<div></div>", "div"), ":root > div");
}

#[test]
fn test_nested() {
    assert_eq!(
        path_of(
            r#"<a id="hi"><b class="hello"><div></div></b></a>"#,
            "div"
        ),
        ":root > a#hi > b.hello > div"
    );
}

#[test]
fn test_position_among_equal_siblings() {
    let root = parse_str("<p><a>1</a><a>2</a><a>3</a></p>").unwrap();
    let paths: Vec<String> = elements(&root, "a")
        .iter()
        .map(|a| locate(a).unwrap().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            ":root > p > a:nth-of-type(1)",
            ":root > p > a:nth-of-type(2)",
            ":root > p > a:nth-of-type(3)"
        ]
    );
}

#[test]
fn test_position_only_when_classes_collide() {
    let root =
        parse_str(r#"<p><a class="red">1</a><a class="red">2</a><b class="red">x</b></p>"#)
            .unwrap();
    let second = elements(&root, "a").remove(1);
    assert_eq!(
        locate(&second).unwrap(),
        ":root > p > a.red:nth-of-type(2)"
    );
    let b = elements(&root, "b").remove(0);
    assert_eq!(locate(&b).unwrap(), ":root > p > b.red");
}

#[test]
fn test_root_and_unaddressable_nodes() {
    let root = parse_str("<p>text<!-- note --><![CDATA[raw]]></p>").unwrap();
    assert_eq!(locate(&root).unwrap(), ":root");
    assert!(locate(&root).unwrap().is_root());

    let p = elements(&root, "p").remove(0);
    for child in p.borrow().children() {
        assert!(locate(child).is_none());
    }
}

#[test]
fn test_every_element_resolves_to_itself() {
    let root = parse_file(fixture("path-roundtrip.html")).unwrap();
    let mut count = 0;
    for node in DfsTreeIterator::new(root.clone()) {
        if !node.borrow().is_element() {
            continue;
        }
        let locator = locate(&node).unwrap();
        let found = resolve(&root, locator.as_str())
            .unwrap()
            .unwrap_or_else(|| panic!("{} does not resolve to one node", locator));
        assert!(same_node(&found, &node), "{} resolved elsewhere", locator);
        assert_eq!(to_markup(&found), to_markup(&node));
        count += 1;
    }
    assert!(count > 30);
}

#[test]
fn test_escaped_names_in_fixture() {
    let root = parse_file(fixture("path-roundtrip.html")).unwrap();
    let span = elements(&root, "span").remove(0);
    let locator = locate(&span).unwrap();
    assert_eq!(
        locator,
        r":root > html > body.home.page > section#\32 nd-part > p > span.w-50\%"
    );

    let section = elements(&root, "section").remove(0);
    assert_eq!(
        locate(&section).unwrap(),
        r":root > html > body.home.page > section#\32 nd-part"
    );
}

#[test]
fn test_fixture_positions() {
    let root = parse_file(fixture("path-roundtrip.html")).unwrap();
    let paths: Vec<String> = elements(&root, "div")
        .iter()
        .map(|div| locate(div).unwrap().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            ":root > html > body.home.page > div.row:nth-of-type(1)",
            ":root > html > body.home.page > div.row:nth-of-type(1) > div.col:nth-of-type(1)",
            ":root > html > body.home.page > div.row:nth-of-type(1) > div.col.wide",
            ":root > html > body.home.page > div.row:nth-of-type(1) > div.col:nth-of-type(3)",
            ":root > html > body.home.page > div.row:nth-of-type(1) > div:nth-of-type(4)",
            ":root > html > body.home.page > div.row:nth-of-type(2)",
        ]
    );
}

#[test]
fn test_select_descendants() {
    let root = parse_file(fixture("path-roundtrip.html")).unwrap();
    assert_eq!(select(&root, "nav a").unwrap().len(), 3);
    assert_eq!(select(&root, "ul > li.x").unwrap().len(), 2);
    assert_eq!(select(&root, "td").unwrap().len(), 4);
    assert!(resolve(&root, "li.x").unwrap().is_none());
    assert!(select(&root, "div >").is_err());
}

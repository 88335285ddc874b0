//! Tests for HTML projection and the CSS selector engine.

use pretty_assertions::assert_eq;
use strider_core::dom::{Document, SelectorList};

const HTML: &str = r#"<html><head><title> Catalogue </title></head><body>
<ul id="list">
  <li class="item first" data-sku="A-1">Apple</li>
  <li class="item" data-sku="B-2">Banana</li>
  <li class="item sale" data-sku="C-3">Cherry</li>
  <li class="item" data-sku="D-4" lang="en-GB">Date</li>
</ul>
<p>Intro <em>text</em> &amp; more</p>
<form><input name="a" disabled><input name="b"><select><option selected>x</option></select></form>
</body></html>"#;

fn texts(doc: &Document, selector: &str) -> Vec<String> {
    let list = SelectorList::parse(selector).unwrap();
    doc.query(&list)
        .into_iter()
        .map(|id| doc.text_content(id))
        .collect()
}

fn count(doc: &Document, selector: &str) -> usize {
    doc.query(&SelectorList::parse(selector).unwrap()).len()
}

#[test]
fn test_parse_and_title() {
    let doc = Document::parse(HTML);
    assert_eq!(doc.title().as_deref(), Some("Catalogue"));
    assert_eq!(texts(&doc, "p"), vec!["Intro text & more"]);
}

#[test]
fn test_simple_selectors() {
    let doc = Document::parse(HTML);
    assert_eq!(count(&doc, "li"), 4);
    assert_eq!(texts(&doc, "#list .sale"), vec!["Cherry"]);
    assert_eq!(texts(&doc, "li.item.first"), vec!["Apple"]);
    assert_eq!(count(&doc, "*"), doc.elements().len());
}

#[test]
fn test_attribute_operators() {
    let doc = Document::parse(HTML);
    assert_eq!(texts(&doc, "[data-sku='B-2']"), vec!["Banana"]);
    assert_eq!(texts(&doc, "[class~=sale]"), vec!["Cherry"]);
    assert_eq!(texts(&doc, "[lang|=en]"), vec!["Date"]);
    assert_eq!(texts(&doc, "[data-sku^=C]"), vec!["Cherry"]);
    assert_eq!(texts(&doc, "[data-sku$='-4']"), vec!["Date"]);
    assert_eq!(count(&doc, "[data-sku*='-']"), 4);
    assert_eq!(count(&doc, "li[lang]"), 1);
}

#[test]
fn test_combinators() {
    let doc = Document::parse(HTML);
    assert_eq!(count(&doc, "ul > li"), 4);
    assert_eq!(count(&doc, "body > li"), 0);
    assert_eq!(texts(&doc, ".first + li"), vec!["Banana"]);
    assert_eq!(texts(&doc, ".sale ~ li"), vec!["Date"]);
    assert_eq!(texts(&doc, "p em"), vec!["text"]);
}

#[test]
fn test_pseudo_classes() {
    let doc = Document::parse(HTML);
    assert_eq!(texts(&doc, "li:first-child"), vec!["Apple"]);
    assert_eq!(texts(&doc, "li:last-child"), vec!["Date"]);
    assert_eq!(texts(&doc, "li:nth-child(2n)"), vec!["Banana", "Date"]);
    assert_eq!(texts(&doc, "li:nth-child(odd)"), vec!["Apple", "Cherry"]);
    assert_eq!(texts(&doc, "li:not(.item.first)").len(), 3);
    assert_eq!(count(&doc, "input:disabled"), 1);
    assert_eq!(count(&doc, "input:enabled"), 1);
    assert_eq!(count(&doc, "option:selected"), 1);
}

#[test]
fn test_selector_groups_keep_document_order() {
    let doc = Document::parse(HTML);
    assert_eq!(texts(&doc, "p, .first"), vec!["Apple", "Intro text & more"]);
}

#[test]
fn test_invalid_selectors() {
    for selector in ["", "  ", "li,", "[unterminated", "li:hover", "a!b"] {
        assert!(SelectorList::parse(selector).is_err(), "{selector:?} parsed");
    }
}

#[test]
fn test_attribute_mutation_and_serialization() {
    let mut doc = Document::parse("<div><a href=\"/x\">Link</a></div>");
    let link = doc.query(&SelectorList::parse("a").unwrap())[0];

    doc.set_attr(link, "title", "a \"quoted\" title");
    doc.remove_attr(link, "href");
    assert_eq!(
        doc.outer_html(link),
        "<a title=\"a &quot;quoted&quot; title\">Link</a>"
    );

    doc.set_text(link, "<b>raw</b>");
    assert_eq!(doc.inner_html(link), "&lt;b&gt;raw&lt;/b&gt;");
    assert_eq!(doc.text_content(link), "<b>raw</b>");
}

#[test]
fn test_whitespace_kept_only_inside_textarea_and_pre() {
    let doc = Document::parse("<div> </div><pre>   </pre><textarea name=\"memo\">  </textarea>");
    let raw = |selector: &str| {
        let id = doc.query(&SelectorList::parse(selector).unwrap())[0];
        doc.raw_text(id)
    };

    assert_eq!(raw("div"), "");
    assert_eq!(raw("pre"), "   ");
    assert_eq!(raw("textarea"), "  ");
}

#[test]
fn test_parse_is_deterministic() {
    assert_eq!(Document::parse(HTML), Document::parse(HTML));
}

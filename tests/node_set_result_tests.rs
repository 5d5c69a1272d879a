mod common;

use common::{TestResult, identified_divs, ids, page};
use domxpath::{DocumentEvaluate, NodeId, ResultError, ResultType};

fn collect_iterator(
    result: &mut domxpath::XPathResult<NodeId>,
) -> Result<Vec<NodeId>, ResultError> {
    let mut nodes = Vec::new();
    while let Some(node) = result.iterate_next()? {
        nodes.push(node);
    }
    Ok(nodes)
}

#[test]
fn test_ordered_snapshot_of_divs() -> TestResult {
    let doc = identified_divs();
    let context = doc.document_element().ok_or("no document element")?;
    let result = doc.evaluate("//div", context, None, ResultType::OrderedNodeSnapshot)?;

    assert_eq!(result.result_type().code(), 7);
    assert_eq!(result.snapshot_length()?, 2);
    let items = (0..result.snapshot_length()?)
        .map(|i| result.snapshot_item(i))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(ids(&doc, &items), vec!["id1", "id2"]);
    Ok(())
}

#[test]
fn test_first_ordered_node() -> TestResult {
    let doc = identified_divs();
    let context = doc.document_element().ok_or("no document element")?;
    let result = doc.evaluate("//div", context, None, ResultType::FirstOrderedNode)?;
    assert_eq!(result.result_type().code(), 9);
    let first = result.single_node_value()?.ok_or("no node selected")?;
    assert_eq!(doc.attribute(first, "id"), Some("id1"));

    // The first node in document order, not the first one the step produced.
    let doc = page();
    let result = doc.evaluate(
        "//span[3]/preceding-sibling::span",
        doc.root(),
        None,
        ResultType::FirstOrderedNode,
    )?;
    let first = result.single_node_value()?.ok_or("no node selected")?;
    assert_eq!(doc.attribute(first, "id"), Some("s1"));
    Ok(())
}

#[test]
fn test_single_node_of_empty_set_is_absent() -> TestResult {
    let doc = identified_divs();
    for requested in [ResultType::FirstOrderedNode, ResultType::AnyUnorderedNode] {
        let result = doc.evaluate("//table", doc.root(), None, requested)?;
        assert_eq!(result.result_type(), requested);
        assert_eq!(result.single_node_value()?, None);
    }
    let result = doc.evaluate("//table", doc.root(), None, ResultType::UnorderedNodeSnapshot)?;
    assert_eq!(result.snapshot_length()?, 0);
    Ok(())
}

#[test]
fn test_iterate_next_until_exhausted() -> TestResult {
    let doc = identified_divs();
    let context = doc.document_element().ok_or("no document element")?;
    let mut result = doc.evaluate("//div", context, None, ResultType::Any)?;

    let nodes = collect_iterator(&mut result)?;
    assert_eq!(ids(&doc, &nodes), vec!["id1", "id2"]);
    assert_eq!(result.iterate_next()?, None);
    assert!(!result.invalid_iterator_state());
    Ok(())
}

#[test]
fn test_reverse_axis_results_are_document_ordered() -> TestResult {
    let doc = page();
    let context = doc.element_by_id("s3").ok_or("missing span")?;
    for requested in [
        ResultType::UnorderedNodeIterator,
        ResultType::OrderedNodeIterator,
    ] {
        let mut result = doc.evaluate("preceding-sibling::*", context, None, requested)?;
        let nodes = collect_iterator(&mut result)?;
        assert_eq!(ids(&doc, &nodes), vec!["s1", "s2"]);
    }
    let result = doc.evaluate("ancestor::*", context, None, ResultType::UnorderedNodeSnapshot)?;
    let names: Vec<String> = result
        .snapshot()?
        .iter()
        .filter_map(|&node| doc.kind(node).ok().and_then(|kind| kind.qualified_name()))
        .collect();
    assert_eq!(names, vec!["html", "body", "div"]);
    Ok(())
}

#[test]
fn test_snapshot_survives_mutation() -> TestResult {
    let mut doc = identified_divs();
    let result = doc.evaluate("//div", doc.root(), None, ResultType::OrderedNodeSnapshot)?;
    let before: Vec<NodeId> = result.snapshot()?.to_vec();

    let body = doc.parent(before[0])?.ok_or("div has no parent")?;
    let extra = doc.create_element("div");
    doc.insert_before(body, extra, Some(before[0]))?;
    doc.remove_child(body, before[1])?;
    doc.set_attribute(before[0], "class", "changed")?;

    assert_eq!(result.snapshot_length()?, 2);
    assert_eq!(result.snapshot_item(0)?, before[0]);
    assert_eq!(result.snapshot_item(1)?, before[1]);
    assert!(result.snapshot_item(2).is_err());

    // A fresh evaluation sees the new tree.
    let after = doc.select_nodes("//div", doc.root())?;
    assert_eq!(after, vec![extra, before[0]]);
    Ok(())
}

#[test]
fn test_iterator_goes_stale_after_structural_change() -> TestResult {
    let mut doc = identified_divs();
    let mut result = doc.evaluate("//div", doc.root(), None, ResultType::OrderedNodeIterator)?;
    let first = result.iterate_next()?.ok_or("no first node")?;
    assert_eq!(doc.attribute(first, "id"), Some("id1"));

    let body = doc.parent(first)?.ok_or("div has no parent")?;
    let extra = doc.create_element("div");
    doc.append_child(body, extra)?;

    assert!(result.invalid_iterator_state());
    assert!(matches!(result.iterate_next(), Err(ResultError::StaleIterator)));
    assert!(matches!(result.iterate_next(), Err(ResultError::StaleIterator)));
    Ok(())
}

#[test]
fn test_any_type_iterator_goes_stale() -> TestResult {
    let mut doc = identified_divs();
    let context = doc.document_element().ok_or("no document element")?;
    let mut result = doc.evaluate("//div", context, None, ResultType::Any)?;
    assert_eq!(result.result_type(), ResultType::UnorderedNodeIterator);

    let first = result.iterate_next()?.ok_or("no first node")?;
    assert_eq!(doc.attribute(first, "id"), Some("id1"));
    assert!(!result.invalid_iterator_state());

    let body = doc.parent(first)?.ok_or("div has no parent")?;
    doc.remove_child(body, first)?;

    assert!(result.invalid_iterator_state());
    assert!(matches!(result.iterate_next(), Err(ResultError::StaleIterator)));
    Ok(())
}

#[test]
fn test_value_changes_do_not_invalidate_iterators() -> TestResult {
    let mut doc = page();
    let mut result = doc.evaluate("//li", doc.root(), None, ResultType::UnorderedNodeIterator)?;
    let first = result.iterate_next()?.ok_or("no first node")?;

    let text = doc.children(first)?[0];
    doc.set_text(text, "changed")?;
    let s1 = doc.element_by_id("s1").ok_or("missing span")?;
    doc.set_attribute(s1, "id", "renamed")?;

    assert!(!result.invalid_iterator_state());
    assert_eq!(collect_iterator(&mut result)?.len(), 3);

    // Adding an attribute is structural.
    let mut result = doc.evaluate("//li", doc.root(), None, ResultType::UnorderedNodeIterator)?;
    doc.set_attribute(first, "class", "new")?;
    assert!(matches!(result.iterate_next(), Err(ResultError::StaleIterator)));
    Ok(())
}

#[test]
fn test_snapshot_index_out_of_range() -> TestResult {
    let doc = identified_divs();
    let result = doc.evaluate("//div", doc.root(), None, ResultType::UnorderedNodeSnapshot)?;
    match result.snapshot_item(5) {
        Err(ResultError::Index { index, length }) => {
            assert_eq!((index, length), (5, 2));
        }
        other => panic!("Expected an index error, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_wrong_accessor_is_type_error() -> TestResult {
    let doc = identified_divs();
    let mut snapshot = doc.evaluate("//div", doc.root(), None, ResultType::OrderedNodeSnapshot)?;
    assert!(snapshot.iterate_next().unwrap_err().is_type_error());
    assert!(snapshot.single_node_value().unwrap_err().is_type_error());

    let iterator = doc.evaluate("//div", doc.root(), None, ResultType::Any)?;
    assert!(iterator.snapshot_length().unwrap_err().is_type_error());
    assert!(iterator.string_value().unwrap_err().is_type_error());
    Ok(())
}

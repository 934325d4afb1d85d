//! Incident resolution and error markup insertion.
//!
//! Incidents are processed strictly in declaration order. Each incident's
//! matched elements and labels are marked with an error class, and a
//! rendered message fragment is inserted relative to an anchor: the single
//! matched element, or the lowest common ancestor of a group.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, QualName, local_name, namespace_url, ns, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use thiserror::Error;

use crate::dom;
use crate::form::{LabelableElement, ResolvedForm};

/// Error produced by an insertion strategy.
pub type InsertError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One incident resolved against a form: the elements it matched, in
/// document order, and its messages.
pub struct MatchedIncident {
    pub elements: Vec<LabelableElement>,
    pub errors: Vec<String>,
}

/// Pluggable strategy for inserting error markup. Receives every matched
/// incident of one form in a single call, in declaration order, so that an
/// implementation can keep incidents sharing an insertion point in that
/// order.
pub trait IncidentInserter {
    fn insert(&self, incidents: &[MatchedIncident]) -> Result<(), InsertError>;
}

/// Where rendered error markup is placed relative to its anchor node (a
/// single matched element, or the lowest common ancestor of several).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Placement {
    /// Immediately before the anchor.
    Before,
    /// Immediately after the anchor.
    #[default]
    After,
    /// Appended as the last child of the anchor's container: the matched
    /// element's parent for a single match (form controls are usually void
    /// elements and cannot carry rendered children), the common ancestor
    /// itself for a group.
    LastChild,
}

/// Renders one incident's messages into an HTML fragment string. The
/// fragment may contain multiple top-level siblings.
pub type MessageRenderer = Box<dyn Fn(&[String]) -> String + Send + Sync>;

/// Default insertion strategy: mark matched elements and their labels with
/// an error class, then insert the rendered fragment near the anchor.
pub struct GenericIncidentInserter {
    /// Class token appended to matched elements and their labels. Appended
    /// once per incident; repeated matches are not deduplicated.
    pub error_class: String,
    pub renderer: MessageRenderer,
    pub single_element_placement: Placement,
    pub multiple_element_placement: Placement,
}

impl Default for GenericIncidentInserter {
    fn default() -> Self {
        Self {
            error_class: "error".to_string(),
            renderer: Box::new(render_error_list),
            single_element_placement: Placement::After,
            multiple_element_placement: Placement::LastChild,
        }
    }
}

/// Process-wide default inserter. Constructed once, never mutated; safe to
/// share across concurrent executions.
pub(crate) static DEFAULT_INCIDENT_INSERTER: LazyLock<GenericIncidentInserter> =
    LazyLock::new(GenericIncidentInserter::default);

#[derive(Debug, Error)]
enum InsertionError {
    #[error("insertion anchor has no parent")]
    DetachedAnchor,
}

impl IncidentInserter for GenericIncidentInserter {
    fn insert(&self, incidents: &[MatchedIncident]) -> Result<(), InsertError> {
        // Last fragment node placed after each anchor, so that incidents
        // resolving to the same anchor land in declaration order.
        let mut trailing = HashMap::new();

        for incident in incidents {
            if incident.elements.is_empty() {
                continue;
            }

            let markup = (self.renderer)(&incident.errors);
            let fragment = parse_error_fragment(&markup);

            for element in &incident.elements {
                append_class_token(&element.element, &self.error_class);
                for label in &element.labels {
                    append_class_token(label, &self.error_class);
                }
            }

            let single = incident.elements.len() == 1;
            let placement = if single {
                self.single_element_placement
            } else {
                self.multiple_element_placement
            };
            let anchor = if single {
                let element = &incident.elements[0].element;
                if placement == Placement::LastChild {
                    dom::parent_of(element).ok_or(InsertionError::DetachedAnchor)?
                } else {
                    element.clone()
                }
            } else {
                lowest_common_ancestor(&incident.elements)
            };
            insert_fragment(&anchor, placement, fragment, &mut trailing)?;
        }
        Ok(())
    }
}

/// Match a form's incidents against its resolved inputs, in declaration
/// order, and hand the non-empty match sets to the insertion strategy in
/// one call. An incident matching nothing in this form produces no output.
pub(crate) fn insert_incidents(
    form: &ResolvedForm,
    inserter: &dyn IncidentInserter,
) -> Result<(), InsertError> {
    let mut matched = Vec::new();
    for incident in &form.incidents {
        let mut elements = Vec::new();
        for input in &form.inputs {
            let Some(name) = dom::attr_value(input, "name") else {
                continue;
            };
            if incident.names.iter().any(|n| *n == name) {
                elements.push(LabelableElement {
                    element: input.clone(),
                    labels: form.labels.get(input).to_vec(),
                });
            }
        }
        if elements.is_empty() {
            continue;
        }
        log::trace!(
            target: "formfill.insert",
            "incident over {:?} matched {} elements in form {:?}",
            incident.names,
            elements.len(),
            form.id,
        );
        matched.push(MatchedIncident {
            elements,
            errors: incident.errors.clone(),
        });
    }
    if matched.is_empty() {
        return Ok(());
    }
    inserter.insert(&matched)
}

/// Parse rendered markup in the context of a `body` element and return the
/// fragment's top-level nodes.
fn parse_error_fragment(markup: &str) -> Vec<Handle> {
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("body")),
        Vec::new(),
    )
    .one(markup);
    // The fragment parser wraps the nodes in a synthetic <html> element.
    let children = dom.document.children.borrow();
    match children.first() {
        Some(root) => root.children.take(),
        None => Vec::new(),
    }
}

/// Append `class` to the node's class attribute, creating it when absent.
fn append_class_token(node: &Handle, class: &str) {
    let NodeData::Element { attrs, .. } = &node.data else {
        return;
    };
    let mut attrs = attrs.borrow_mut();
    if let Some(attr) = attrs::find_mut(&mut attrs, "class") {
        attr.value.push_slice(" ");
        attr.value.push_slice(class);
    } else {
        attrs::set(&mut attrs, "class", class);
    }
}

/// Lowest common ancestor of the matched elements, by iterative pairwise
/// narrowing: fold each element into a running ancestor by finding the
/// deepest node shared between the two ancestor chains. The document root
/// is an ancestor of every node, so this always lands somewhere.
fn lowest_common_ancestor(elements: &[LabelableElement]) -> Handle {
    let mut running = elements[0].element.clone();
    for element in &elements[1..] {
        running = deepest_shared_ancestor(&running, &element.element);
    }
    running
}

fn deepest_shared_ancestor(a: &Handle, b: &Handle) -> Handle {
    let b_ancestors = dom::ancestors(b);
    let mut current = dom::parent_of(a);
    while let Some(candidate) = current {
        if b_ancestors.iter().any(|n| Rc::ptr_eq(n, &candidate)) {
            return candidate;
        }
        current = dom::parent_of(&candidate);
    }
    // Nodes of one document always share the root.
    a.clone()
}

/// Insert `nodes` relative to `anchor`. `trailing` records the last node
/// inserted after each anchor within one insertion pass; a repeated `After`
/// insertion continues behind it instead of splitting the earlier fragment
/// off the anchor.
fn insert_fragment(
    anchor: &Handle,
    placement: Placement,
    nodes: Vec<Handle>,
    trailing: &mut HashMap<usize, Handle>,
) -> Result<(), InsertError> {
    match placement {
        Placement::LastChild => {
            for node in nodes {
                dom::append_child(anchor, node);
            }
        }
        Placement::Before => {
            let parent = dom::parent_of(anchor).ok_or(InsertionError::DetachedAnchor)?;
            let position =
                dom::child_position(&parent, anchor).ok_or(InsertionError::DetachedAnchor)?;
            dom::insert_children_at(&parent, position, nodes);
        }
        Placement::After => {
            let key = Rc::as_ptr(anchor) as usize;
            let base = trailing.get(&key).unwrap_or(anchor).clone();
            let parent = dom::parent_of(&base).ok_or(InsertionError::DetachedAnchor)?;
            let position =
                dom::child_position(&parent, &base).ok_or(InsertionError::DetachedAnchor)?;
            if let Some(last) = nodes.last() {
                trailing.insert(key, last.clone());
            }
            dom::insert_children_at(&parent, position + 1, nodes);
        }
    }
    Ok(())
}

/// Default renderer: an unordered list with one item per message.
fn render_error_list(errors: &[String]) -> String {
    let mut out = String::from("<ul class=\"errors\">");
    for error in errors {
        out.push_str("<li>");
        push_escaped(&mut out, error);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::find_by_id;
    use crate::test_util::parse;

    fn labelable(element: Handle) -> LabelableElement {
        LabelableElement {
            element,
            labels: Vec::new(),
        }
    }

    #[test]
    fn renderer_escapes_messages() {
        let out = render_error_list(&["a < b & \"c\"".to_string(), "d".to_string()]);
        assert_eq!(
            out,
            "<ul class=\"errors\"><li>a &lt; b &amp; &quot;c&quot;</li><li>d</li></ul>",
        );
    }

    #[test]
    fn fragment_parsing_returns_all_top_level_siblings() {
        let nodes = parse_error_fragment("<p>one</p><p>two</p>");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn class_token_is_appended_not_replaced() {
        let document = parse(
            "<!DOCTYPE html><html><body><input id=\"f\" class=\"wide\"></body></html>",
        );
        let input = find_by_id(&document, "f").unwrap();
        append_class_token(&input, "error");
        assert_eq!(dom::attr_value(&input, "class").as_deref(), Some("wide error"));
        append_class_token(&input, "error");
        assert_eq!(dom::attr_value(&input, "class").as_deref(), Some("wide error error"));
    }

    #[test]
    fn lca_of_siblings_is_their_container() {
        let document = parse(
            "<!DOCTYPE html><html><body><div id=\"group\">\
             <input id=\"a\"><input id=\"b\">\
             </div></body></html>",
        );
        let group = find_by_id(&document, "group").unwrap();
        let elements = vec![
            labelable(find_by_id(&document, "a").unwrap()),
            labelable(find_by_id(&document, "b").unwrap()),
        ];
        assert!(Rc::ptr_eq(&lowest_common_ancestor(&elements), &group));
    }

    #[test]
    fn lca_narrows_across_subtrees() {
        let document = parse(
            "<!DOCTYPE html><html><body id=\"top\">\
             <div><p><input id=\"a\"></p><input id=\"b\"></div>\
             <span><input id=\"c\"></span>\
             </body></html>",
        );
        let body = find_by_id(&document, "top").unwrap();
        let elements = vec![
            labelable(find_by_id(&document, "a").unwrap()),
            labelable(find_by_id(&document, "b").unwrap()),
            labelable(find_by_id(&document, "c").unwrap()),
        ];
        let lca = lowest_common_ancestor(&elements);
        assert!(Rc::ptr_eq(&lca, &body));
        // The LCA is an ancestor of every element, and no child of it is.
        for element in &elements {
            assert!(dom::ancestors(&element.element)
                .iter()
                .any(|n| Rc::ptr_eq(n, &lca)));
        }
    }

    #[test]
    fn lca_of_nested_elements_is_the_outer_parent() {
        let document = parse(
            "<!DOCTYPE html><html><body><div id=\"outer\">\
             <input id=\"a\"><p><input id=\"b\"></p>\
             </div></body></html>",
        );
        let outer = find_by_id(&document, "outer").unwrap();
        let elements = vec![
            labelable(find_by_id(&document, "a").unwrap()),
            labelable(find_by_id(&document, "b").unwrap()),
        ];
        assert!(Rc::ptr_eq(&lowest_common_ancestor(&elements), &outer));
    }

    #[test]
    fn fragment_placements() {
        for (placement, want) in [
            (Placement::Before, "<ul class=\"errors\"></ul><div id=\"d\"></div>"),
            (Placement::After, "<div id=\"d\"></div><ul class=\"errors\"></ul>"),
            (Placement::LastChild, "<div id=\"d\"><ul class=\"errors\"></ul></div>"),
        ] {
            let document = parse("<!DOCTYPE html><html><body><div id=\"d\"></div></body></html>");
            let anchor = find_by_id(&document, "d").unwrap();
            let nodes = parse_error_fragment("<ul class=\"errors\"></ul>");
            insert_fragment(&anchor, placement, nodes, &mut HashMap::new()).unwrap();
            let out = crate::test_util::serialize(&document);
            assert!(out.contains(want), "{placement:?}: {out}");
        }
    }

    #[test]
    fn repeated_after_insertions_keep_their_order() {
        let document = parse("<!DOCTYPE html><html><body><div id=\"d\"></div></body></html>");
        let anchor = find_by_id(&document, "d").unwrap();
        let mut trailing = HashMap::new();
        for markup in ["<p>first</p>", "<p>second</p><p>third</p>", "<p>fourth</p>"] {
            let nodes = parse_error_fragment(markup);
            insert_fragment(&anchor, Placement::After, nodes, &mut trailing).unwrap();
        }
        let out = crate::test_util::serialize(&document);
        assert!(
            out.contains(
                "<div id=\"d\"></div><p>first</p><p>second</p><p>third</p><p>fourth</p>",
            ),
            "{out}",
        );
    }

    #[test]
    fn last_child_on_a_single_element_appends_to_its_parent() {
        let document = parse(
            "<!DOCTYPE html><html><body><div id=\"wrap\">\
             <input id=\"f\"><span>hint</span>\
             </div></body></html>",
        );
        let inserter = GenericIncidentInserter {
            single_element_placement: Placement::LastChild,
            ..GenericIncidentInserter::default()
        };
        let incidents = [MatchedIncident {
            elements: vec![labelable(find_by_id(&document, "f").unwrap())],
            errors: vec!["msg".to_string()],
        }];
        inserter.insert(&incidents).unwrap();
        let out = crate::test_util::serialize(&document);
        assert!(
            out.contains(
                "<input id=\"f\" class=\"error\"><span>hint</span>\
                 <ul class=\"errors\"><li>msg</li></ul></div>",
            ),
            "{out}",
        );
    }

    #[test]
    fn detached_anchor_is_an_error() {
        let document = parse("<!DOCTYPE html><html><body></body></html>");
        let nodes = parse_error_fragment("<p>x</p>");
        let err = insert_fragment(&document, Placement::After, nodes, &mut HashMap::new());
        assert!(err.is_err());
    }
}

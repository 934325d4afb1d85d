//! Form scope resolution.
//!
//! A single pre-order walk attributes elements to forms (by nesting or by an
//! explicit `form` attribute), associates `option` elements with their
//! enclosing `select`, and links elements to labels they are nested in.
//! Labels that reference an element by id instead are deferred and resolved
//! in a second pass once every form's inputs are known.

use html5ever::Attribute;
use markup5ever_rcdom::{Handle, NodeData};

use crate::dom;
use crate::form::ResolvedForm;

/// Transient per-branch traversal context. Cloned for every child so that
/// context changes in one subtree never leak into a sibling subtree.
#[derive(Clone, Default)]
struct FormContext {
    form: Option<Handle>,
    label: Option<Handle>,
    select: Option<Handle>,
}

pub(crate) struct Resolver<'a> {
    forms: &'a mut [ResolvedForm],
    /// Labels carrying a `for` attribute, matched against input ids after
    /// the walk.
    deferred_labels: Vec<Handle>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(forms: &'a mut [ResolvedForm]) -> Self {
        Self {
            forms,
            deferred_labels: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, document: &Handle) {
        self.walk(document, FormContext::default());
        self.cross_resolve_labels();
        for form in self.forms.iter() {
            log::debug!(
                target: "formfill.traverse",
                "form {:?}: {} inputs, {} deferred labels in document",
                form.id,
                form.inputs.len(),
                self.deferred_labels.len(),
            );
        }
    }

    fn walk(&mut self, node: &Handle, mut context: FormContext) {
        if let NodeData::Element { name, attrs, .. } = &node.data {
            match &*name.local {
                "form" => context.form = Some(node.clone()),
                "label" => context.label = Some(node.clone()),
                _ => {}
            }
            self.visit_element(node, &name.local, &attrs.borrow(), &mut context);
        }
        // The subtree is walked even when the element itself was not
        // interesting; nested content may belong to a form of interest.
        for child in node.children.borrow().iter() {
            self.walk(child, context.clone());
        }
    }

    fn visit_element(
        &mut self,
        node: &Handle,
        name: &str,
        attrs: &[Attribute],
        context: &mut FormContext,
    ) {
        // An element is interesting only inside a form context or when it
        // carries an explicit `form` reference.
        let form_attr = attrs::find(attrs, "form");
        if context.form.is_none() && form_attr.is_none() {
            return;
        }

        // An explicit `form` attribute wins; an empty or missing one falls
        // back to the enclosing form's id.
        let mut form_id = form_attr.map(|a| a.value.to_string()).unwrap_or_default();
        if form_id.is_empty() {
            if let Some(form) = &context.form {
                form_id = dom::attr_value(form, "id").unwrap_or_default();
            }
        }

        let Some(form_ix) = self.form_index(&form_id) else {
            return;
        };

        // Labels either reference an element by id (`for`) or contain one as
        // a descendant. The former are resolved after the walk; the walk of
        // their subtree still continues for nested association.
        if name == "label" && attrs::has(attrs, "for") {
            self.deferred_labels.push(node.clone());
            return;
        }

        if name == "option" {
            if let Some(select) = &context.select {
                let select = select.clone();
                self.forms[form_ix].options.push(&select, node.clone());
            }
            return;
        }

        // Nothing to key population on without a name.
        if attrs::get(attrs, "name").is_empty() {
            return;
        }

        match name {
            "input" | "textarea" | "progress" | "meter" => {}
            "button" => {
                if attrs::get(attrs, "type") != "submit" {
                    return;
                }
            }
            "select" => context.select = Some(node.clone()),
            _ => return,
        }

        self.forms[form_ix].inputs.push(node.clone());
        if let Some(label) = &context.label {
            let label = label.clone();
            self.forms[form_ix].labels.push(node, label);
        }
    }

    fn form_index(&self, id: &str) -> Option<usize> {
        self.forms.iter().position(|f| f.id == id)
    }

    /// Second pass: append every deferred label whose `for` value matches an
    /// input's id to that input's label list, after any nested matches.
    fn cross_resolve_labels(&mut self) {
        for form in self.forms.iter_mut() {
            for label in &self.deferred_labels {
                let Some(target) = dom::attr_value(label, "for") else {
                    continue;
                };
                for input in &form.inputs {
                    if dom::attr_value(input, "id").as_deref() == Some(target.as_str()) {
                        form.labels.push(input, label.clone());
                    }
                }
            }
        }
    }
}

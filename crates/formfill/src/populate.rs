//! Per-element-type value population rules.

use html5ever::Attribute;
use markup5ever_rcdom::{Handle, NodeData};

use crate::dom;
use crate::filter::FormPopulationFilter;
use crate::form::ResolvedForm;

/// Apply the population rule for every resolved input that has a supplied
/// value. Elements without an entry in the values mapping keep all of their
/// existing attributes and content.
pub(crate) fn populate(filter: &FormPopulationFilter, form: &ResolvedForm) {
    for input in &form.inputs {
        let NodeData::Element { name, attrs, .. } = &input.data else {
            continue;
        };
        let field = attrs::get(&attrs.borrow(), "name").to_string();
        let Some(values) = form.values.get(&field).filter(|v| !v.is_empty()) else {
            continue;
        };
        log::trace!(
            target: "formfill.populate",
            "populating <{}> {:?} in form {:?}",
            name.local,
            field,
            form.id,
        );
        match &*name.local {
            "select" => populate_select(form, input, values),
            "textarea" => dom::replace_children_with_text(input, &values[0]),
            _ => {
                let mut attrs = attrs.borrow_mut();
                populate_input(filter, &mut attrs, values);
            }
        }
    }
}

/// Clear the selection marker on every option of `select`, then set it on
/// each option whose value matches any supplied value.
fn populate_select(form: &ResolvedForm, select: &Handle, values: &[String]) {
    for option in form.options.get(select) {
        let NodeData::Element { attrs, .. } = &option.data else {
            continue;
        };
        let mut attrs = attrs.borrow_mut();
        attrs::remove(&mut attrs, "selected");
        let value = attrs::get(&attrs, "value").to_string();
        if values.iter().any(|v| *v == value) {
            attrs::set(&mut attrs, "selected", "selected");
        }
    }
}

fn populate_input(filter: &FormPopulationFilter, attrs: &mut Vec<Attribute>, values: &[String]) {
    let kind = attrs::get(attrs, "type").to_string();
    match kind.as_str() {
        "radio" | "checkbox" => {
            // A missing value attribute means implicit "on" semantics: the
            // presence of any supplied value checks the element.
            let value = attrs::find(attrs, "value").map(|a| a.value.to_string());
            attrs::remove(attrs, "checked");
            if value.is_none() || value.as_deref() == Some(values[0].as_str()) {
                attrs::set(attrs, "checked", "checked");
            }
        }
        // Browsers refuse to pre-fill these.
        "file" | "image" => {}
        _ => {
            if kind == "password" && !filter.include_password_inputs {
                return;
            }
            if kind == "hidden" && !filter.include_hidden_inputs {
                return;
            }
            // Every existing value attribute goes, including duplicates the
            // attribute list may carry.
            attrs::remove(attrs, "value");
            attrs::set(attrs, "value", &values[0]);
        }
    }
}

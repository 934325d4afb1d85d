//! Caller-facing form description and the per-execution resolved state.

use std::collections::HashMap;

use markup5ever_rcdom::Handle;

use crate::dom::NodeListMap;

/// Submitted values keyed by field name. Multiple values for one name
/// represent multi-selects or repeated-name inputs; the order is preserved.
pub type Values = HashMap<String, Vec<String>>;

/// A form to populate and annotate, matched by its `id` attribute. The empty
/// string is a valid, matchable id (the "no id" form).
#[derive(Clone, Debug, Default)]
pub struct Form {
    pub id: String,
    pub values: Values,
    pub incidents: Vec<Incident>,
}

/// One validation failure unit: one or more field names sharing one or more
/// messages, rendered together as a single markup fragment.
///
/// Multiple names cover element groups with a common error, e.g. the inputs
/// `new-password` and `new-password-confirm` sharing "passwords do not
/// match". Unknown or duplicate names are tolerated.
#[derive(Clone, Debug, Default)]
pub struct Incident {
    pub names: Vec<String>,
    pub errors: Vec<String>,
}

/// A populatable element together with its resolved labels.
#[derive(Clone)]
pub struct LabelableElement {
    pub element: Handle,
    pub labels: Vec<Handle>,
}

/// Per-form state derived during resolution. Built fresh for every
/// execution and discarded with it.
pub(crate) struct ResolvedForm {
    pub(crate) id: String,
    pub(crate) values: Values,
    pub(crate) incidents: Vec<Incident>,
    /// Populatable elements in document order, each recorded once.
    pub(crate) inputs: Vec<Handle>,
    /// Labels associated with an input, nested matches before `for` matches.
    pub(crate) labels: NodeListMap,
    /// Option elements associated with a select.
    pub(crate) options: NodeListMap,
}

impl ResolvedForm {
    pub(crate) fn new(form: Form) -> Self {
        Self {
            id: form.id,
            values: form.values,
            incidents: form.incidents,
            inputs: Vec::new(),
            labels: NodeListMap::default(),
            options: NodeListMap::default(),
        }
    }
}

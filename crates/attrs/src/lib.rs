//! Helpers for reading and mutating an element's attribute list.
//!
//! Attribute lists are ordered and may contain duplicate keys; the first
//! match is canonical. Absent keys are a normal, silent case, never an error.

use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, QualName, namespace_url, ns};

/// First attribute named `name`, if any.
pub fn find<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|a| &*a.name.local == name)
}

/// Mutable variant of [`find`].
pub fn find_mut<'a>(attrs: &'a mut [Attribute], name: &str) -> Option<&'a mut Attribute> {
    attrs.iter_mut().find(|a| &*a.name.local == name)
}

/// Value of the first attribute named `name`, or the empty string.
pub fn get<'a>(attrs: &'a [Attribute], name: &str) -> &'a str {
    find(attrs, name).map(|a| &*a.value).unwrap_or("")
}

pub fn has(attrs: &[Attribute], name: &str) -> bool {
    find(attrs, name).is_some()
}

/// Replace the value of the first attribute named `name`, or append a new
/// attribute when none exists.
pub fn set(attrs: &mut Vec<Attribute>, name: &str, value: &str) {
    if let Some(attr) = find_mut(attrs, name) {
        attr.value = StrTendril::from(value);
        return;
    }
    attrs.push(Attribute {
        name: QualName::new(None, ns!(), LocalName::from(name)),
        value: StrTendril::from(value),
    });
}

/// Remove every attribute named `name`.
pub fn remove(attrs: &mut Vec<Attribute>, name: &str) {
    attrs.retain(|a| &*a.name.local != name);
}

//! Form value population and error message insertion.
//!
//! Population re-fills HTML form elements with previously submitted values,
//! typically when a user is sent back to a form that failed validation. The
//! document is parsed, populatable elements (`input`, `textarea`, `select`,
//! `progress`, `meter`, and submit `button`s) are discovered per form, and
//! each element with a supplied value is populated according to its kind:
//!
//! - `textarea`: the text content is replaced.
//! - `select`: options matching a supplied value get the `selected`
//!   attribute; multiple values select multiple options.
//! - `input[type=radio]`, `input[type=checkbox]`: the `checked` attribute is
//!   set when the element's value matches (or when it has no value).
//! - any other `input`: the `value` attribute is set.
//!
//! Error message insertion takes a list of [`Incident`]s per form. An
//! incident names one or more fields and carries one or more messages; when
//! its fields match discovered elements, the configured [`IncidentInserter`]
//! marks those elements and their labels with an error class and inserts
//! rendered message markup near them: after a single element, or at the
//! lowest common ancestor of a group.
//!
//! ```no_run
//! use formfill::{Form, FormPopulationFilter, Values};
//!
//! let html = r#"<form><input type="text" name="name"></form>"#;
//! let mut values = Values::new();
//! values.insert("name".to_string(), vec!["Ada".to_string()]);
//!
//! let filter = FormPopulationFilter::new();
//! filter
//!     .execute(
//!         vec![Form { values, ..Form::default() }],
//!         html.as_bytes(),
//!         std::io::stdout(),
//!     )
//!     .unwrap();
//! ```

mod dom;
mod filter;
mod form;
mod insert;
mod populate;
#[cfg(test)]
mod test_util;
mod traverse;

pub use filter::{Error, FormPopulationFilter};
pub use form::{Form, Incident, LabelableElement, Values};
pub use insert::{
    GenericIncidentInserter, IncidentInserter, InsertError, MatchedIncident, MessageRenderer,
    Placement,
};

pub use markup5ever_rcdom::Handle;

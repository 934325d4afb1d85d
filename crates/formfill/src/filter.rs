//! Pipeline configuration and entry points.

use std::io::{self, Read, Write};

use html5ever::ParseOpts;
use html5ever::serialize::SerializeOpts;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{RcDom, SerializableHandle};
use thiserror::Error;

use crate::form::{Form, ResolvedForm};
use crate::insert::{self, DEFAULT_INCIDENT_INSERTER, IncidentInserter, InsertError};
use crate::populate;
use crate::traverse::Resolver;

/// Pipeline failure. There is no partial output: either the whole document
/// is resolved, populated, and annotated, or nothing is written.
///
/// Unmatched incidents, orphaned label references, and values for fields the
/// document does not contain are tolerated and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read input document")]
    Parse(#[source] io::Error),
    #[error("failed to serialize output document")]
    Serialize(#[source] io::Error),
    #[error("template execution failed")]
    Template(#[source] io::Error),
    #[error("incident insertion failed: {0}")]
    Insert(InsertError),
}

/// Populates HTML form elements with previously submitted values and inserts
/// validation error markup.
///
/// One call to [`execute`](Self::execute) owns one document tree for its
/// duration; nothing is cached or reused across calls.
pub struct FormPopulationFilter {
    /// Insertion strategy for incidents; the process-wide default
    /// ([`GenericIncidentInserter`](crate::GenericIncidentInserter)) when
    /// `None`.
    pub incident_insertion: Option<Box<dyn IncidentInserter + Send + Sync>>,
    /// Whether hidden inputs are populated.
    pub include_hidden_inputs: bool,
    /// Whether password inputs are populated.
    pub include_password_inputs: bool,
}

impl Default for FormPopulationFilter {
    fn default() -> Self {
        Self {
            incident_insertion: None,
            include_hidden_inputs: true,
            include_password_inputs: false,
        }
    }
}

impl FormPopulationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a UTF-8 HTML document from `reader`, populate and annotate the
    /// forms matching the provided ids, and serialize the result to
    /// `writer`.
    pub fn execute<R: Read, W: Write>(
        &self,
        forms: Vec<Form>,
        mut reader: R,
        writer: W,
    ) -> Result<(), Error> {
        let dom = html5ever::parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut reader)
            .map_err(Error::Parse)?;

        let mut resolved = resolution_slots(forms);
        Resolver::new(&mut resolved).run(&dom.document);

        let inserter: &dyn IncidentInserter = match &self.incident_insertion {
            Some(custom) => custom.as_ref(),
            None => &*DEFAULT_INCIDENT_INSERTER,
        };

        for form in &resolved {
            populate::populate(self, form);
            insert::insert_incidents(form, inserter).map_err(Error::Insert)?;
        }

        let document: SerializableHandle = dom.document.clone().into();
        html5ever::serialize::serialize(writer, &document, SerializeOpts::default())
            .map_err(Error::Serialize)
    }

    /// Render a template into a buffer and feed it to [`execute`]. The
    /// template is any byte-producing step; its output is assumed to be
    /// UTF-8 HTML.
    ///
    /// [`execute`]: Self::execute
    pub fn execute_template<W, F>(
        &self,
        forms: Vec<Form>,
        template: F,
        writer: W,
    ) -> Result<(), Error>
    where
        W: Write,
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut rendered = Vec::new();
        template(&mut rendered).map_err(Error::Template)?;
        self.execute(forms, rendered.as_slice(), writer)
    }
}

/// One resolution slot per distinct form id; a later duplicate id replaces
/// the earlier entry.
fn resolution_slots(forms: Vec<Form>) -> Vec<ResolvedForm> {
    let mut slots: Vec<ResolvedForm> = Vec::with_capacity(forms.len());
    for form in forms {
        if let Some(existing) = slots.iter_mut().find(|s| s.id == form.id) {
            *existing = ResolvedForm::new(form);
        } else {
            slots.push(ResolvedForm::new(form));
        }
    }
    slots
}

use html5ever::ParseOpts;
use html5ever::serialize::SerializeOpts;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, RcDom, SerializableHandle};

use crate::form::{Form, ResolvedForm, Values};
use crate::traverse::Resolver;

pub(crate) fn parse(input: &str) -> Handle {
    let dom = html5ever::parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut input.as_bytes())
        .unwrap();
    dom.document
}

pub(crate) fn serialize(document: &Handle) -> String {
    let mut out = Vec::new();
    let handle: SerializableHandle = document.clone().into();
    html5ever::serialize::serialize(&mut out, &handle, SerializeOpts::default()).unwrap();
    String::from_utf8(out).unwrap()
}

pub(crate) fn resolve(document: &Handle, forms: Vec<Form>) -> Vec<ResolvedForm> {
    let mut resolved: Vec<ResolvedForm> = forms.into_iter().map(ResolvedForm::new).collect();
    Resolver::new(&mut resolved).run(document);
    resolved
}

pub(crate) fn values(pairs: &[(&str, &[&str])]) -> Values {
    pairs
        .iter()
        .map(|(name, values)| {
            (
                (*name).to_string(),
                values.iter().map(|v| (*v).to_string()).collect(),
            )
        })
        .collect()
}

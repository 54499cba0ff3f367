//! HTML serialization helpers shared by virtual nodes and server rendering.

use std::borrow::Cow;

/// Elements that never have content and are serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param", "source", "track", "wbr",
];

#[must_use]
pub fn is_void(tag: &str) -> bool {
	VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
	html_escape::encode_text(text)
}

#[must_use]
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
	html_escape::encode_double_quoted_attribute(value)
}

pub(crate) fn write_start_tag<'a>(html: &mut String, tag: &str, attributes: impl IntoIterator<Item = (&'a str, &'a str)>) {
	html.push('<');
	html.push_str(tag);
	for (name, value) in attributes {
		html.push(' ');
		html.push_str(name);
		html.push_str("=\"");
		html.push_str(&escape_attribute(value));
		html.push('"');
	}
	html.push('>');
}

pub(crate) fn write_end_tag(html: &mut String, tag: &str) {
	if !is_void(tag) {
		html.push_str("</");
		html.push_str(tag);
		html.push('>');
	}
}

/// The subset of CSS selectors understood by virtual nodes.
///
/// That's one compound of a tag or `*` followed by any number of `#id` and `.class` parts,
/// e.g. `li.Item.Selected#b`. Combinators, attributes and pseudo-classes aren't supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
	Universal,
	Tag(String),
	Id(String),
	Class(String),
	/// Every part must match.
	Compound(Vec<Selector>),
}

impl Selector {
	#[must_use]
	pub fn parse(selector: &str) -> Option<Self> {
		let selector = selector.trim();
		if selector.is_empty() {
			return None;
		}

		let mut parts = Vec::new();
		let mut rest = selector;
		let head_len = rest.find(['#', '.']).unwrap_or(rest.len());
		match &rest[..head_len] {
			"" => (),
			"*" => parts.push(Self::Universal),
			tag if is_name(tag) => parts.push(Self::Tag(tag.to_ascii_lowercase())),
			_ => return None,
		}
		rest = &rest[head_len..];

		while let Some(sigil) = rest.chars().next() {
			let body = &rest[1..];
			let len = body.find(['#', '.']).unwrap_or(body.len());
			let name = &body[..len];
			if !is_name(name) {
				return None;
			}
			parts.push(match sigil {
				'#' => Self::Id(name.to_owned()),
				_ => Self::Class(name.to_owned()),
			});
			rest = &body[len..];
		}

		if parts.len() == 1 {
			parts.pop()
		} else {
			Some(Self::Compound(parts))
		}
	}

	pub(crate) fn matches(&self, tag: &str, id: Option<&str>, class: Option<&str>) -> bool {
		match self {
			Self::Universal => true,
			Self::Tag(expected) => tag.eq_ignore_ascii_case(expected),
			Self::Id(expected) => id == Some(expected.as_str()),
			Self::Class(expected) => class.map_or(false, |class| class.split_whitespace().any(|c| c == expected)),
			Self::Compound(parts) => parts.iter().all(|part| part.matches(tag, id, class)),
		}
	}
}

fn is_name(name: &str) -> bool {
	!name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

//! Markup node representation.
//!
//! The core treats markup as an immutable value type: every modification is
//! a structural copy (`with_attr`, `append_attr_token`, `merge_over`). The
//! render composer relies on exactly these operations and nothing else.

use std::borrow::Cow;

use crate::error::{CoreResult, ElementError};

/// HTML boolean attributes: present means active regardless of value, so a
/// falsy value means the attribute must be omitted entirely.
pub const BOOLEAN_ATTRS: &[&str] = &[
	"allowfullscreen",
	"async",
	"autofocus",
	"autoplay",
	"checked",
	"controls",
	"default",
	"defer",
	"disabled",
	"formnovalidate",
	"hidden",
	"inert",
	"ismap",
	"itemscope",
	"loop",
	"multiple",
	"muted",
	"nomodule",
	"novalidate",
	"open",
	"playsinline",
	"readonly",
	"required",
	"reversed",
	"selected",
	"truespeed",
];

/// Returns whether a boolean attribute value means "set the attribute".
pub fn is_boolean_attr_truthy(value: &str) -> bool {
	!value.is_empty() && value != "false" && value != "0"
}

fn escape_into(output: &mut String, text: &str) {
	for c in text.chars() {
		match c {
			'&' => output.push_str("&amp;"),
			'<' => output.push_str("&lt;"),
			'>' => output.push_str("&gt;"),
			'"' => output.push_str("&quot;"),
			'\'' => output.push_str("&#x27;"),
			_ => output.push(c),
		}
	}
}

/// A tree of renderable markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	/// A DOM element.
	Element(ElementNode),
	/// A text node.
	Text(Cow<'static, str>),
	/// Multiple nodes with no wrapper element.
	Fragment(Vec<Node>),
	/// Renders nothing.
	Empty,
}

impl Node {
	/// Creates a text node.
	pub fn text(content: impl Into<Cow<'static, str>>) -> Self {
		Self::Text(content.into())
	}

	/// Unwraps the single element root of this node.
	///
	/// A bare `Element` qualifies, as does a `Fragment` containing exactly
	/// one `Element`. Anything else is a malformed base fragment.
	pub fn into_element(self) -> CoreResult<ElementNode> {
		match self {
			Node::Element(element) => Ok(element),
			Node::Fragment(mut children) if children.len() == 1 => {
				match children.pop() {
					Some(Node::Element(element)) => Ok(element),
					_ => Err(ElementError::MalformedFragment),
				}
			}
			_ => Err(ElementError::MalformedFragment),
		}
	}

	/// Serializes the node tree to an HTML string.
	pub fn render_to_string(&self) -> String {
		let mut output = String::new();
		self.render_into(&mut output);
		output
	}

	fn render_into(&self, output: &mut String) {
		match self {
			Node::Element(element) => element.render_into(output),
			Node::Text(text) => escape_into(output, text),
			Node::Fragment(children) => {
				for child in children {
					child.render_into(output);
				}
			}
			Node::Empty => {}
		}
	}
}

impl From<ElementNode> for Node {
	fn from(element: ElementNode) -> Self {
		Node::Element(element)
	}
}

impl From<String> for Node {
	fn from(text: String) -> Self {
		Node::Text(Cow::Owned(text))
	}
}

impl From<&'static str> for Node {
	fn from(text: &'static str) -> Self {
		Node::Text(Cow::Borrowed(text))
	}
}

/// A single element: tag name, ordered attributes, ordered children.
///
/// # Examples
///
/// ```
/// use filament_core::ElementNode;
///
/// let input = ElementNode::new("input")
///     .attr("type", "text")
///     .attr("value", "hello");
/// assert_eq!(input.render_to_string(), r#"<input type="text" value="hello" />"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
	tag: Cow<'static, str>,
	attrs: Vec<(Cow<'static, str>, Cow<'static, str>)>,
	children: Vec<Node>,
	is_void: bool,
}

impl ElementNode {
	/// Creates an element with the given tag and no attributes or children.
	pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
		let tag = tag.into();
		let is_void = matches!(
			tag.as_ref(),
			"area"
				| "base" | "br"
				| "col" | "embed"
				| "hr" | "img"
				| "input" | "link"
				| "meta" | "source"
				| "track" | "wbr"
		);
		Self {
			tag,
			attrs: Vec::new(),
			children: Vec::new(),
			is_void,
		}
	}

	/// Adds an attribute (builder style). Does not overwrite; for
	/// set-or-overwrite semantics use [`ElementNode::with_attr`].
	pub fn attr(
		mut self,
		name: impl Into<Cow<'static, str>>,
		value: impl Into<Cow<'static, str>>,
	) -> Self {
		self.attrs.push((name.into(), value.into()));
		self
	}

	/// Adds a child node (builder style).
	pub fn child(mut self, child: impl Into<Node>) -> Self {
		self.children.push(child.into());
		self
	}

	/// Returns the tag name.
	pub fn tag_name(&self) -> &str {
		&self.tag
	}

	/// Returns the attributes in order.
	pub fn attrs(&self) -> &[(Cow<'static, str>, Cow<'static, str>)] {
		&self.attrs
	}

	/// Returns the children in order.
	pub fn children(&self) -> &[Node] {
		&self.children
	}

	/// Returns whether this is a void element (no closing tag).
	pub fn is_void(&self) -> bool {
		self.is_void
	}

	/// Returns the value of the named attribute, if present.
	pub fn attr_value(&self, name: &str) -> Option<&str> {
		self.attrs
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.as_ref())
	}

	/// Returns a copy with the named attribute set, overwriting an existing
	/// value in place (position preserved) or appending if absent.
	pub fn with_attr(
		&self,
		name: impl Into<Cow<'static, str>>,
		value: impl Into<Cow<'static, str>>,
	) -> Self {
		let mut node = self.clone();
		node.set_attr(name.into(), value.into());
		node
	}

	/// Returns a copy with `token` appended to the named attribute's
	/// space-separated value list, or the attribute set to `token` if it was
	/// absent. Used for the dispatch attribute, where several event bindings
	/// each contribute one directive.
	pub fn append_attr_token(
		&self,
		name: impl Into<Cow<'static, str>>,
		token: &str,
	) -> Self {
		let name = name.into();
		let mut node = self.clone();
		match node.attrs.iter_mut().find(|(n, _)| *n == name) {
			Some((_, value)) => {
				let mut joined = value.to_string();
				joined.push(' ');
				joined.push_str(token);
				*value = Cow::Owned(joined);
			}
			None => node.attrs.push((name, Cow::Owned(token.to_string()))),
		}
		node
	}

	/// Returns a copy with `children` appended after the existing children.
	pub fn with_appended_children(&self, children: impl IntoIterator<Item = Node>) -> Self {
		let mut node = self.clone();
		node.children.extend(children);
		node
	}

	/// Merges this element (the base fragment) over a supplied rendering
	/// context.
	///
	/// The result keeps the base's tag; its children are the context's
	/// children followed by the base's own; its attributes are the context's
	/// overlaid by the base's (base wins on conflict).
	pub fn merge_over(&self, context: &ElementNode) -> Self {
		let mut merged = ElementNode::new(self.tag.clone());
		merged.attrs = context.attrs.clone();
		for (name, value) in &self.attrs {
			merged.set_attr(name.clone(), value.clone());
		}
		merged.children = context.children.clone();
		merged.children.extend(self.children.iter().cloned());
		merged
	}

	fn set_attr(&mut self, name: Cow<'static, str>, value: Cow<'static, str>) {
		match self.attrs.iter_mut().find(|(n, _)| *n == name) {
			Some((_, existing)) => *existing = value,
			None => self.attrs.push((name, value)),
		}
	}

	/// Serializes this element to an HTML string.
	pub fn render_to_string(&self) -> String {
		let mut output = String::new();
		self.render_into(&mut output);
		output
	}

	fn render_into(&self, output: &mut String) {
		output.push('<');
		output.push_str(&self.tag);

		for (name, value) in &self.attrs {
			// Falsy boolean attributes must be omitted, not set to "false"
			if BOOLEAN_ATTRS.contains(&name.as_ref()) && !is_boolean_attr_truthy(value) {
				continue;
			}
			output.push(' ');
			output.push_str(name);
			output.push_str("=\"");
			escape_into(output, value);
			output.push('"');
		}

		if self.is_void {
			output.push_str(" />");
		} else {
			output.push('>');
			for child in &self.children {
				child.render_into(output);
			}
			output.push_str("</");
			output.push_str(&self.tag);
			output.push('>');
		}
	}
}

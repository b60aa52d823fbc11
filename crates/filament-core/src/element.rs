//! Reactive elements and the render composer.
//!
//! A reactive element composes a baseline markup fragment with a fixed set
//! of property bindings and event bindings into one renderable object aware
//! of every session it has been rendered to. The shared render algorithm
//! lives here as [`render`]/[`render_into`]; the inbound report path is
//! [`dispatch_report`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use filament_reactive::Subscription;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::CoreResult;
use crate::event::{DISPATCH_ATTR, EventSource};
use crate::node::{ElementNode, Node};
use crate::page::Page;
use crate::property::PropertySource;
use crate::registry;

/// The set of pages an element is currently registered to.
///
/// Pages are held weakly and keyed by page id; an entry is removed
/// deterministically when the page's subscription scope closes.
#[derive(Default)]
pub struct PageSet {
	inner: RwLock<HashMap<String, Weak<dyn Page>>>,
}

impl PageSet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a page. Returns `true` if it was not registered before.
	pub fn insert(&self, page: &Arc<dyn Page>) -> bool {
		self.inner
			.write()
			.insert(page.id().to_string(), Arc::downgrade(page))
			.is_none()
	}

	/// Returns whether the page id is registered.
	pub fn contains(&self, page_id: &str) -> bool {
		self.inner.read().contains_key(page_id)
	}

	/// Removes a page by id.
	pub fn remove(&self, page_id: &str) {
		self.inner.write().remove(page_id);
	}

	/// Number of registered pages.
	pub fn len(&self) -> usize {
		self.inner.read().len()
	}

	/// Returns whether no page is registered.
	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}
}

/// The base contract every reactive element variant exposes.
///
/// Concrete variants supply the baseline fragment and the ordered binding
/// sequences; the render algorithm itself is shared and lives in
/// [`render`]/[`render_into`].
pub trait ReactiveElement: Send + Sync {
	/// The baseline markup fragment (a single element).
	fn base(&self) -> &ElementNode;

	/// The ordered property bindings.
	fn properties(&self) -> Vec<Arc<dyn PropertySource>>;

	/// The ordered event bindings.
	fn events(&self) -> Vec<Arc<dyn EventSource>>;

	/// Child reactive elements appended after the core render. Empty for
	/// non-composite variants.
	fn children(&self) -> Vec<Arc<dyn ReactiveElement>> {
		Vec::new()
	}

	/// The slot holding the element's resolved identifier. Filled on first
	/// render and stable afterwards.
	fn id_slot(&self) -> &OnceCell<String>;

	/// The pages this element is registered to.
	fn pages(&self) -> &PageSet;
}

/// What one binding (or the composite's children) adds to the rendered
/// node. The render algorithm is a fold over these; there is no dispatch
/// through a widget hierarchy.
enum Contribution {
	/// A property binding sets/overwrites its attribute.
	Value { name: String, value: String },
	/// An event binding appends its directive to the dispatch attribute.
	Dispatch { directive: String },
	/// A composite appends fully-rendered child elements.
	Children(Vec<Node>),
}

fn apply(node: ElementNode, contribution: Contribution) -> ElementNode {
	match contribution {
		Contribution::Value { name, value } => node.with_attr(name, value),
		Contribution::Dispatch { directive } => node.append_attr_token(DISPATCH_ATTR, &directive),
		Contribution::Children(children) => node.with_appended_children(children),
	}
}

/// Renders an element for a page, using the element's own base fragment as
/// the full context.
pub fn render(element: Arc<dyn ReactiveElement>, page: &Arc<dyn Page>) -> ElementNode {
	render_core(element, None, page)
}

/// Renders an element for a page into a supplied markup context (e.g. a
/// template placeholder).
///
/// The result's children are the context's children followed by the base
/// fragment's own; its attributes are the context's overlaid by the base's,
/// base winning on conflict.
pub fn render_into(
	element: Arc<dyn ReactiveElement>,
	context: &ElementNode,
	page: &Arc<dyn Page>,
) -> ElementNode {
	render_core(element, Some(context), page)
}

fn render_core(
	element: Arc<dyn ReactiveElement>,
	context: Option<&ElementNode>,
	page: &Arc<dyn Page>,
) -> ElementNode {
	// 1. Resolve or allocate the identifier. The first render fixes it;
	// later renders (any session) reuse the slot.
	let (base, id) = match element.id_slot().get() {
		Some(id) => (element.base().with_attr("id", id.clone()), id.clone()),
		None => {
			let (node, id) = registry::with_id(element.base(), Some(page.as_ref()));
			let id = element.id_slot().get_or_init(|| id).clone();
			(node.with_attr("id", id.clone()), id)
		}
	};

	// 2. Merge into the supplied context, base winning.
	let node = match context {
		Some(context) => base.merge_over(context),
		None => base,
	};

	// 3. Register against the page. Re-rendering to an already-registered
	// page refreshes attributes but attaches no second subscription.
	let newly_registered = element.pages().insert(page);
	registry::registry().register(&id, &element);
	if newly_registered {
		trace!(element_id = %id, page = %page.id(), "element registered to page");
		let weak_element = Arc::downgrade(&element);
		let page_id = page.id().to_string();
		page.observing().adopt(Subscription::new(move || {
			if let Some(element) = weak_element.upgrade() {
				element.pages().remove(&page_id);
			}
		}));
	}

	// 4-6. Fold the contributions over the node, properties first, then
	// dispatch directives, then rendered composite children.
	let mut contributions = Vec::new();
	for property in element.properties() {
		contributions.push(Contribution::Value {
			name: property.name().to_string(),
			value: property.render_attr(),
		});
		if newly_registered {
			property.attach(&id, page);
		}
	}
	for event in element.events() {
		contributions.push(Contribution::Dispatch {
			directive: event.dispatch_directive(&id),
		});
	}
	let rendered_children: Vec<Node> = element
		.children()
		.iter()
		.map(|child| Node::Element(render(child.clone(), page)))
		.collect();
	if !rendered_children.is_empty() {
		contributions.push(Contribution::Children(rendered_children));
	}

	contributions.into_iter().fold(node, apply)
}

/// Routes an inbound client event report.
///
/// Looks the element up by id, feeds matching two-way property bindings,
/// then fires matching event bindings. Unknown ids, unregistered pages, and
/// non-matching binding names are normal churn: the report is dropped
/// silently and `false` is returned. The return value is diagnostic only.
pub fn dispatch_report(page: &dyn Page, element_id: &str, event: &str, raw: &Value) -> bool {
	let Some(element) = registry::registry().lookup(element_id) else {
		trace!(element_id, event, "report for unknown or collected element dropped");
		return false;
	};
	if !element.pages().contains(page.id()) {
		debug!(
			element_id,
			event,
			page = %page.id(),
			"report from unregistered page dropped"
		);
		return false;
	}

	let mut handled = false;
	for property in element.properties() {
		if property.client_event() == Some(event) {
			match property.accept(page, raw) {
				Ok(()) => handled = true,
				Err(err) => debug!(element_id, event, %err, "two-way payload dropped"),
			}
		}
	}
	for source in element.events() {
		if source.name() == event {
			handled |= source.fire_raw(raw);
		}
	}
	if !handled {
		trace!(element_id, event, "report matched no binding");
	}
	handled
}

/// The standard reactive element: one base fragment, ordered bindings,
/// optional composite children. Built via [`Element::builder`].
pub struct Element {
	base: ElementNode,
	properties: Vec<Arc<dyn PropertySource>>,
	events: Vec<Arc<dyn EventSource>>,
	children: Vec<Arc<dyn ReactiveElement>>,
	id: OnceCell<String>,
	pages: PageSet,
}

impl Element {
	/// Starts building an element over the given base fragment.
	pub fn builder(base: impl Into<Node>) -> ElementBuilder {
		ElementBuilder {
			base: base.into(),
			properties: Vec::new(),
			events: Vec::new(),
			children: Vec::new(),
		}
	}
}

impl ReactiveElement for Element {
	fn base(&self) -> &ElementNode {
		&self.base
	}

	fn properties(&self) -> Vec<Arc<dyn PropertySource>> {
		self.properties.clone()
	}

	fn events(&self) -> Vec<Arc<dyn EventSource>> {
		self.events.clone()
	}

	fn children(&self) -> Vec<Arc<dyn ReactiveElement>> {
		self.children.clone()
	}

	fn id_slot(&self) -> &OnceCell<String> {
		&self.id
	}

	fn pages(&self) -> &PageSet {
		&self.pages
	}
}

/// Builder for [`Element`].
pub struct ElementBuilder {
	base: Node,
	properties: Vec<Arc<dyn PropertySource>>,
	events: Vec<Arc<dyn EventSource>>,
	children: Vec<Arc<dyn ReactiveElement>>,
}

impl ElementBuilder {
	/// Adds a property binding. Order of addition is render order.
	pub fn property(mut self, property: impl PropertySource + 'static) -> Self {
		self.properties.push(Arc::new(property));
		self
	}

	/// Adds an event binding. Order of addition is render order.
	pub fn event(mut self, event: impl EventSource + 'static) -> Self {
		self.events.push(Arc::new(event));
		self
	}

	/// Appends a child reactive element (composite variant).
	pub fn child(mut self, child: Arc<dyn ReactiveElement>) -> Self {
		self.children.push(child);
		self
	}

	/// Validates the base fragment and builds the element.
	///
	/// # Errors
	///
	/// [`ElementError::MalformedFragment`](crate::ElementError::MalformedFragment)
	/// if the base fragment is not exactly one element.
	pub fn build(self) -> CoreResult<Arc<Element>> {
		let base = self.base.into_element()?;
		Ok(Arc::new(Element {
			base,
			properties: self.properties,
			events: self.events,
			children: self.children,
			id: OnceCell::new(),
			pages: PageSet::new(),
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ElementError;
	use crate::event::{Change, EventBinding};
	use crate::page::ChannelPage;
	use crate::property::PropertyBinding;
	use filament_reactive::Var;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_build_rejects_malformed_fragment() {
		let result = Element::builder("just text").build();
		assert!(matches!(result, Err(ElementError::MalformedFragment)));
	}

	#[rstest]
	fn test_render_assigns_stable_id() {
		let (page, _rx) = ChannelPage::new();
		let page: Arc<dyn Page> = page;
		let element = Element::builder(ElementNode::new("div")).build().unwrap();

		let first = render(element.clone(), &page);
		let second = render(element.clone(), &page);

		let id = first.attr_value("id").unwrap();
		assert_eq!(second.attr_value("id"), Some(id));
		assert_eq!(element.id_slot().get().map(String::as_str), Some(id));
	}

	#[rstest]
	fn test_render_respects_programmer_supplied_id() {
		let (page, _rx) = ChannelPage::new();
		let page: Arc<dyn Page> = page;
		let element = Element::builder(ElementNode::new("div").attr("id", "mine"))
			.build()
			.unwrap();

		let node = render(element, &page);

		assert_eq!(node.attr_value("id"), Some("mine"));
	}

	#[rstest]
	fn test_render_into_merges_context_base_wins() {
		// Arrange
		let (page, _rx) = ChannelPage::new();
		let page: Arc<dyn Page> = page;
		let context = ElementNode::new("div").attr("a", "0").child("from context");
		let element = Element::builder(ElementNode::new("div").attr("a", "1"))
			.build()
			.unwrap();

		// Act
		let node = render_into(element, &context, &page);

		// Assert
		assert_eq!(node.attr_value("a"), Some("1"));
		assert_eq!(node.children()[0], Node::text("from context"));
	}

	#[rstest]
	fn test_duplicate_render_registers_page_once() {
		let (page, _rx) = ChannelPage::new();
		let page: Arc<dyn Page> = page;
		let element = Element::builder(ElementNode::new("div")).build().unwrap();

		render(element.clone(), &page);
		render(element.clone(), &page);

		assert_eq!(element.pages().len(), 1);
	}

	#[rstest]
	fn test_page_close_removes_element_from_page_set() {
		let (page, _rx) = ChannelPage::new();
		let dyn_page: Arc<dyn Page> = page.clone();
		let element = Element::builder(ElementNode::new("div")).build().unwrap();
		render(element.clone(), &dyn_page);
		assert!(element.pages().contains(page.id()));

		page.close();

		assert!(element.pages().is_empty());
	}

	#[rstest]
	fn test_property_order_is_render_order() {
		let (page, _rx) = ChannelPage::new();
		let page: Arc<dyn Page> = page;
		let element = Element::builder(ElementNode::new("div"))
			.property(PropertyBinding::new("a", Var::new(1i64)))
			.property(PropertyBinding::new("b", Var::new(2i64)))
			.build()
			.unwrap();

		let node = render(element, &page);

		let names: Vec<&str> = node
			.attrs()
			.iter()
			.map(|(name, _)| name.as_ref())
			.collect();
		let a = names.iter().position(|n| *n == "a").unwrap();
		let b = names.iter().position(|n| *n == "b").unwrap();
		assert!(a < b);
	}

	#[rstest]
	fn test_composite_appends_rendered_children() {
		let (page, _rx) = ChannelPage::new();
		let page: Arc<dyn Page> = page;
		let child = Element::builder(ElementNode::new("span")).build().unwrap();
		let parent = Element::builder(ElementNode::new("div").child("static"))
			.child(child)
			.build()
			.unwrap();

		let node = render(parent, &page);

		assert_eq!(node.children().len(), 2);
		assert!(matches!(&node.children()[1], Node::Element(el) if el.tag_name() == "span"));
	}

	#[rstest]
	fn test_dispatch_unknown_id_is_silent() {
		let (page, _rx) = ChannelPage::new();
		assert!(!dispatch_report(
			page.as_ref(),
			"no-such-element",
			"change",
			&json!({})
		));
	}

	#[rstest]
	fn test_dispatch_unmatched_binding_name_is_silent() {
		let (page, _rx) = ChannelPage::new();
		let dyn_page: Arc<dyn Page> = page.clone();
		let element = Element::builder(ElementNode::new("input"))
			.event(EventBinding::<Change>::new("change"))
			.build()
			.unwrap();
		let node = render(element, &dyn_page);
		let id = node.attr_value("id").unwrap();

		assert!(!dispatch_report(page.as_ref(), id, "click", &json!({})));
	}

	#[rstest]
	fn test_dispatch_from_unregistered_page_is_dropped() {
		let (page, _rx) = ChannelPage::new();
		let dyn_page: Arc<dyn Page> = page.clone();
		let (stranger, _stranger_rx) = ChannelPage::new();
		let element = Element::builder(ElementNode::new("input"))
			.event(EventBinding::<Change>::new("change"))
			.build()
			.unwrap();
		let node = render(element, &dyn_page);
		let id = node.attr_value("id").unwrap();

		assert!(!dispatch_report(
			stranger.as_ref(),
			id,
			"change",
			&json!({"value": "x"})
		));
	}
}

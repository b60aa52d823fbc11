//! End-to-end tests for the render composition and synchronization model:
//! identifier assignment, attribute merging, update ordering, echo
//! suppression, stale-report tolerance, and registration idempotence.

use std::sync::Arc;

use filament_core::{
	Change, ChannelPage, Element, ElementNode, EventBinding, Page, PropertyBinding, ReactiveElement,
	dispatch_report, render, render_into, with_id,
};
use filament_reactive::Var;
use parking_lot::RwLock;
use rstest::rstest;
use serde_json::json;

fn page() -> (Arc<dyn Page>, tokio::sync::mpsc::UnboundedReceiver<filament_core::PropertyUpdate>) {
	let (page, rx) = ChannelPage::new();
	(page, rx)
}

#[rstest]
fn identifier_assignment_is_idempotent() {
	// Without a session: randomized fallback, fixed after first assignment
	let node = ElementNode::new("div");
	let (once, id_once) = with_id(&node, None);
	let (twice, id_twice) = with_id(&once, None);
	assert_eq!(once, twice);
	assert_eq!(id_once, id_twice);

	// With a session: drawn from the page generator, likewise idempotent
	let (page, _rx) = page();
	let (assigned, id) = with_id(&node, Some(page.as_ref()));
	let (reassigned, same_id) = with_id(&assigned, Some(page.as_ref()));
	assert_eq!(assigned, reassigned);
	assert_eq!(id, same_id);
}

#[rstest]
fn attribute_merge_base_wins() {
	let (page, _rx) = page();
	let context = ElementNode::new("div").attr("a", "0");
	let element = Element::builder(ElementNode::new("div").attr("a", "1"))
		.build()
		.unwrap();

	let node = render_into(element, &context, &page);

	assert_eq!(node.attr_value("a"), Some("1"));
}

#[rstest]
fn updates_arrive_in_write_order_without_coalescing() {
	// Arrange
	let (page, mut rx) = page();
	let var = Var::new(0i64);
	let element = Element::builder(ElementNode::new("span"))
		.property(PropertyBinding::new("data-count", var.clone()))
		.build()
		.unwrap();
	render(element, &page);

	// Act
	var.set(1);
	var.set(2);
	var.set(3);

	// Assert: exactly three instructions, in order
	for expected in ["1", "2", "3"] {
		let update = rx.try_recv().unwrap();
		assert_eq!(update.attribute, "data-count");
		assert_eq!(update.value, expected);
	}
	assert!(rx.try_recv().is_err());
}

#[rstest]
fn two_way_change_is_not_echoed_to_origin() {
	let (origin, mut origin_rx) = page();
	let (other, mut other_rx) = page();
	let var = Var::new(String::from("start"));
	let element = Element::builder(ElementNode::new("input"))
		.property(PropertyBinding::new("value", var.clone()).with_client_event("change"))
		.build()
		.unwrap();
	let node = render(element.clone(), &origin);
	render(element, &other);
	let id = node.attr_value("id").unwrap();

	dispatch_report(origin.as_ref(), id, "change", &json!({"value": "x"}));

	assert_eq!(var.get(), "x");
	// The originating session sees nothing; the other session gets the update
	assert!(origin_rx.try_recv().is_err());
	assert_eq!(other_rx.try_recv().unwrap().value, "x");
	assert!(other_rx.try_recv().is_err());
}

#[rstest]
fn stale_dispatch_completes_without_emission() {
	let (page, _rx) = page();
	let handled = dispatch_report(page.as_ref(), "gone-0001", "change", &json!({"value": "x"}));
	assert!(!handled);
}

#[rstest]
fn repeated_render_keeps_one_registration_and_fresh_attributes() {
	// Arrange
	let (page, mut rx) = page();
	let var = Var::new(String::from("a"));
	let element = Element::builder(ElementNode::new("input"))
		.property(PropertyBinding::new("value", var.clone()))
		.build()
		.unwrap();

	// Act
	render(element.clone(), &page);
	var.set(String::from("b"));
	let second = render(element.clone(), &page);

	// Assert: one page registration, one subscription (one update for the
	// write), and the re-render reflects the latest state
	assert_eq!(element.pages().len(), 1);
	assert_eq!(rx.try_recv().unwrap().value, "b");
	assert!(rx.try_recv().is_err());
	assert_eq!(second.attr_value("value"), Some("b"));
}

#[rstest]
fn input_value_change_scenario_end_to_end() {
	// Construct: <input> with a two-way "value" property and a "change" event
	let value = Var::new(String::from("hello"));
	let element = Element::builder(ElementNode::new("input"))
		.property(PropertyBinding::new("value", value.clone()).with_client_event("change"))
		.event(EventBinding::<Change>::new("change"))
		.build()
		.unwrap();

	// Render to session S1
	let (page, mut rx) = page();
	let node = render(element.clone(), &page);
	let id = node.attr_value("id").unwrap().to_string();
	assert_eq!(node.attr_value("value"), Some("hello"));
	assert_eq!(node.attr_value("data-event"), Some(format!("change:{id}").as_str()));
	let html = node.render_to_string();
	assert!(html.starts_with("<input "));
	assert!(html.contains(&format!("id=\"{id}\"")));
	assert!(html.contains("value=\"hello\""));

	// Server-side write: exactly one update instruction to S1
	value.set(String::from("world"));
	let update = rx.try_recv().unwrap();
	assert_eq!(update.element_id, id);
	assert_eq!(update.attribute, "value");
	assert_eq!(update.value, "world");
	assert!(rx.try_recv().is_err());

	// Client report: variable updated, nothing echoed back to S1
	let handled = dispatch_report(page.as_ref(), &id, "change", &json!({"value": "typed"}));
	assert!(handled);
	assert_eq!(value.get(), "typed");
	assert!(rx.try_recv().is_err());
}

#[rstest]
fn change_stream_emits_exactly_once_per_report() {
	let value = Var::new(String::from("hello"));
	let change = EventBinding::<Change>::new("change");
	let seen = Arc::new(RwLock::new(Vec::new()));
	{
		let seen = seen.clone();
		// Subscriptions are explicitly cancelled, never drop-cancelled, so
		// holding the handle here is enough for the test's lifetime
		let sub = change
			.stream()
			.subscribe(move |event: &Change| seen.write().push(event.value.clone()));
		std::mem::forget(sub);
	}
	let element = Element::builder(ElementNode::new("input"))
		.property(PropertyBinding::new("value", value.clone()).with_client_event("change"))
		.event(change)
		.build()
		.unwrap();

	let (page, mut rx) = page();
	let node = render(element, &page);
	let id = node.attr_value("id").unwrap();

	dispatch_report(page.as_ref(), id, "change", &json!({"value": "typed"}));

	assert_eq!(*seen.read(), vec!["typed"]);
	assert_eq!(value.get(), "typed");
	assert!(rx.try_recv().is_err());
}

#[rstest]
fn session_end_stops_all_delivery() {
	let (channel_page, mut rx) = ChannelPage::new();
	let page: Arc<dyn Page> = channel_page.clone();
	let var = Var::new(0i64);
	let element = Element::builder(ElementNode::new("span"))
		.property(PropertyBinding::new("data-n", var.clone()))
		.build()
		.unwrap();
	render(element.clone(), &page);

	var.set(1);
	channel_page.close();
	var.set(2);

	assert_eq!(rx.try_recv().unwrap().value, "1");
	assert!(rx.try_recv().is_err());
	assert!(element.pages().is_empty());
}

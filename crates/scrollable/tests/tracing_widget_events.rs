//! Widget log output, captured through a `tracing_subscriber` layer.

use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scrollable::{ScrollableWidget, ScrollbarPosition, WidgetConfig};
use scrollable_core::HostDocument;
use scrollable_web::HeadlessDocument;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    target: String,
    message: String,
}

#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.0,
        });
    }
}

fn with_captured_tracing<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    let events = capture.events.lock().unwrap().clone();
    events
}

fn attached_widget() -> (Rc<HeadlessDocument>, ScrollableWidget<HeadlessDocument>) {
    let doc = Rc::new(HeadlessDocument::new());
    let element = doc.create_element("enhanced-dom-scrollable");
    doc.append_child(doc.root(), element).expect("append");
    let widget =
        ScrollableWidget::new(Rc::clone(&doc), element, WidgetConfig::default()).expect("widget");
    widget.on_attach().expect("attach");
    doc.flush_events();
    (doc, widget)
}

fn messages<'a>(events: &'a [CapturedEvent], target: &str) -> Vec<&'a str> {
    events
        .iter()
        .filter(|e| e.target == target)
        .map(|e| e.message.as_str())
        .collect()
}

#[test]
fn malformed_scrollbars_attribute_warns() {
    let (_doc, widget) = attached_widget();
    let events = with_captured_tracing(|| {
        assert!(widget.set_scrollbars_str("[\"left\"").is_err());
    });

    let warnings: Vec<_> = events
        .iter()
        .filter(|e| e.level == Level::WARN && e.target == "scrollable.widget")
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "Malformed scrollbars attribute");
    assert_eq!(widget.scrollbars().len(), 2);
}

#[test]
fn coalesced_requests_log_a_single_pass() {
    let (doc, widget) = attached_widget();
    let events = with_captured_tracing(|| {
        widget
            .set_scrollbars(vec![ScrollbarPosition::Right])
            .expect("right");
        widget.set_scrollbars(vec![]).expect("none");
        doc.advance(Duration::from_millis(10));
    });

    let scheduler = messages(&events, "scrollable.scheduler");
    assert_eq!(
        scheduler
            .iter()
            .filter(|m| **m == "Running render pass")
            .count(),
        1
    );
    assert!(scheduler.contains(&"Render request coalesced"));
    assert_eq!(
        messages(&events, "scrollable.widget")
            .iter()
            .filter(|m| **m == "Render pass complete")
            .count(),
        1
    );
    assert!(events.iter().all(|e| e.level != Level::ERROR));
}

//! Log output of the tracker and scheduler, captured through a
//! `tracing_subscriber` layer.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use scrollable_runtime::{Dispose, HookError, SubscriptionTracker};
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

fn noop() -> Dispose {
    Box::new(|| {})
}

#[test]
fn failing_hook_is_logged_as_warning() {
    let events = with_captured_tracing(|| {
        let mut tracker: SubscriptionTracker<&'static str, u32> = SubscriptionTracker::new();
        tracker.register("good", || Some(1), |_: &u32| Ok(noop()));
        tracker.register("bad", || Some(2), |_: &u32| Err(HookError::Failed("boom".into())));
        let err = tracker.refresh().expect_err("bad hook fails");
        assert_eq!(err.failures().len(), 1);
    });

    let warnings: Vec<_> = events
        .iter()
        .filter(|e| e.level == Level::WARN && e.target == "scrollable.tracker")
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "Hook failed; role left unbound");
    assert!(
        events
            .iter()
            .any(|e| e.level == Level::DEBUG && e.message == "Attached subscription")
    );
}

#[test]
fn unchanged_refresh_attaches_nothing() {
    let mut tracker: SubscriptionTracker<&'static str, u32> = SubscriptionTracker::new();
    tracker.register("role", || Some(7), |_: &u32| Ok(noop()));
    tracker.refresh().expect("first refresh");

    let events = with_captured_tracing(|| {
        let summary = tracker.refresh().expect("second refresh");
        assert_eq!(summary.unchanged, 1);
    });

    assert!(events.iter().all(|e| e.message != "Attached subscription"));
    assert!(events.iter().all(|e| e.level != Level::WARN));
}

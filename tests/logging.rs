//! Verifies the crate actually emits the tracing events SPEC_FULL.md's
//! logging section promises, captured the way a caller's own subscriber
//! would see them rather than by reading stdout.

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::dispatcher::Dispatch;
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;

use meshphys::{Cloth, ClothConfig, Hull, HullConfig, Vec3};

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

#[derive(Clone, Debug)]
struct CapturedEvent {
    message: Option<String>,
}

#[derive(Default)]
struct MessageCollector {
    message: Option<String>,
}

impl Visit for MessageCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut collector = MessageCollector::default();
        event.record(&mut collector);
        self.events.lock().unwrap().push(CapturedEvent { message: collector.message });
    }
}

fn contains(events: &[CapturedEvent], needle: &str) -> bool {
    events.iter().any(|e| e.message.as_deref().is_some_and(|m| m.contains(needle)))
}

#[test]
fn hull_construct_emits_iteration_debug_events() {
    let capture = Capture::default();
    let events = capture.events.clone();
    let dispatch = Dispatch::new(Registry::default().with(capture));

    let points = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    tracing::dispatcher::with_default(&dispatch, || {
        Hull::construct(&points, &HullConfig::default()).unwrap();
    });

    let events = events.lock().unwrap();
    assert!(contains(&events, "hull iteration complete"));
}

#[test]
fn cloth_step_emits_solved_debug_event() {
    let capture = Capture::default();
    let events = capture.events.clone();
    let dispatch = Dispatch::new(Registry::default().with(capture));

    let verts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
    let tris = vec![[0u32, 1, 2]];
    let config = ClothConfig { k_s: 10.0, gravity: Vec3::new(0.0, -1.0, 0.0), ..Default::default() };
    let mut cloth = Cloth::new(&verts, &tris, config).unwrap();

    tracing::dispatcher::with_default(&dispatch, || {
        cloth.step(1.0 / 60.0).unwrap();
    });

    let events = events.lock().unwrap();
    assert!(contains(&events, "cloth step solved"));
}

//! End-to-end engine tests: configuration in, frames out.
//!
//! Data sources are scripted and the transport records every frame, so these run
//! without touching the host system or a device.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use steelclock::app::{Engine, EngineOptions, supervise};
use steelclock::config::{AppConfig, WidgetKind};
use steelclock::shutdown::ControlEvent;
use steelclock::sources::{LockKeys, NoProbe, SystemProbe};
use steelclock::{Frame, MetricError, Transport, TransportError};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Frame>>>);

impl Recorder {
    /// Wait until a recorded frame satisfies `accept`.
    fn wait_for(&self, accept: impl Fn(&Frame) -> bool) -> Option<Frame> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(frame) = self.0.lock().iter().rev().find(|f| accept(f)) {
                return Some(frame.clone());
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }
}

impl Transport for Recorder {
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        self.0.lock().push(frame.clone());
        Ok(())
    }
}

/// Memory pinned at 100 %, every lock key on.
struct Pinned;

impl SystemProbe for Pinned {
    fn memory(&mut self) -> Result<f32, MetricError> {
        Ok(100.0)
    }

    fn lock_keys(&mut self) -> Result<LockKeys, MetricError> {
        Ok(LockKeys {
            caps: true,
            num: true,
            scroll: true,
        })
    }
}

fn options(recorder: &Recorder) -> EngineOptions {
    EngineOptions::new(Box::new(recorder.clone())).with_probes(Arc::new(|kind| -> Box<dyn SystemProbe> {
        match kind {
            WidgetKind::Memory | WidgetKind::Keyboard => Box::new(Pinned),
            _ => Box::new(NoProbe),
        }
    }))
}

fn lit_in(frame: &Frame, x0: u32, x1: u32) -> usize {
    (0..frame.height())
        .flat_map(|y| (x0..x1).map(move |x| (x, y)))
        .filter(|&(x, y)| frame.pixel(x, y).is_some_and(|p| p >= 128))
        .count()
}

const SPLIT_CONFIG: &str = r#"{
    "display": {"width": 128, "height": 40, "background_color": 0},
    "widgets": [
        {
            "type": "memory",
            "id": "mem",
            "position": {"x": 0, "y": 0, "w": 64, "h": 40},
            "properties": {"display_mode": "bar_horizontal"}
        },
        {
            "type": "keyboard",
            "id": "keys",
            "position": {"x": 64, "y": 0, "w": 64, "h": 40},
            "enabled": false
        }
    ]
}"#;

// ═════════════════════════════════════════════════════════════════════════
// Engine
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn test_full_bar_lights_only_its_half() {
    let config = AppConfig::from_json(SPLIT_CONFIG).unwrap();
    let recorder = Recorder::default();
    let engine = Engine::start(&config, options(&recorder)).unwrap();
    assert_eq!(engine.unit_count(), 1, "Disabled widget gets no unit");

    let frame = recorder
        .wait_for(|f| f.pixel(32, 20) == Some(255))
        .expect("memory bar should reach the display");
    engine.stop().unwrap();

    assert_eq!((frame.width(), frame.height()), (128, 40));
    assert!(lit_in(&frame, 0, 64) > 64 * 20, "Full bar covers most of its tile");
    assert_eq!(lit_in(&frame, 64, 128), 0, "Nothing drawn where the disabled widget sits");
}

#[test]
fn test_overlapping_widget_draws_on_top() {
    let config = AppConfig::from_json(
        r#"{
            "widgets": [
                {
                    "type": "memory",
                    "id": "under",
                    "position": {"x": 0, "y": 0, "w": 128, "h": 40, "z_order": 0},
                    "properties": {"display_mode": "bar_horizontal"}
                },
                {
                    "type": "memory",
                    "id": "over",
                    "position": {"x": 0, "y": 0, "w": 32, "h": 40, "z_order": 1},
                    "properties": {"display_mode": "bar_horizontal", "fill_color": 60},
                    "style": {"background_color": 0, "background_opacity": 255}
                }
            ]
        }"#,
    )
    .unwrap();
    let recorder = Recorder::default();
    let engine = Engine::start(&config, options(&recorder)).unwrap();

    let frame = recorder
        .wait_for(|f| f.pixel(16, 20) == Some(60) && f.pixel(96, 20) == Some(255))
        .expect("both bars should be composited");
    engine.stop().unwrap();

    assert_eq!(frame.pixel(100, 20), Some(255), "Lower widget visible outside the overlap");
}

#[test]
fn test_invalid_layout_fails_before_start() {
    let result = AppConfig::from_json(
        r#"{"widgets": [{"type": "memory", "position": {"x": 0, "y": 0, "w": 0, "h": 10}}]}"#,
    );
    assert!(result.is_err(), "Zero width widget must fail validation");
}

// ═════════════════════════════════════════════════════════════════════════
// Supervisor
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn test_reload_swaps_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, SPLIT_CONFIG).unwrap();
    let config = AppConfig::load(&path).unwrap();

    let recorder = Recorder::default();
    let (tx, rx) = mpsc::channel();
    let options = options(&recorder);
    let supervisor = thread::spawn(move || supervise(&path, &config, options, &rx));

    assert!(recorder.wait_for(|f| f.pixel(32, 20) == Some(255)).is_some());

    std::fs::write(
        dir.path().join("config.json"),
        r#"{
            "widgets": [{
                "type": "memory",
                "id": "mem",
                "position": {"x": 64, "y": 0, "w": 64, "h": 40},
                "properties": {"display_mode": "bar_horizontal"}
            }]
        }"#,
    )
    .unwrap();
    tx.send(ControlEvent::Reload).unwrap();

    let moved = recorder.wait_for(|f| f.pixel(96, 20) == Some(255) && f.pixel(32, 20) == Some(0));
    tx.send(ControlEvent::Shutdown).unwrap();
    let result = supervisor.join().unwrap();

    assert!(moved.is_some(), "Reloaded layout should reach the display");
    assert!(result.is_ok());
}

#[test]
fn test_closed_channel_stops_supervisor() {
    let recorder = Recorder::default();
    let (tx, rx) = mpsc::channel::<ControlEvent>();
    drop(tx);

    let result = supervise(
        std::path::Path::new("unused.json"),
        &AppConfig::default(),
        options(&recorder),
        &rx,
    );
    assert!(result.is_ok());
}

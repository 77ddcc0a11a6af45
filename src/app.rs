//! Engine lifecycle and the supervisor loop.
//!
//! An [`Engine`] is one running configuration: a canvas, one scheduling
//! thread per enabled widget and one compositor thread. Engines are never
//! mutated; a configuration reload stops the running engine and starts a
//! fresh one, handing the transport and probe factory over.
//!
//! ```text
//!  signals ──► ControlEvent ──► supervise()
//!                                  │ Reload: load + validate new config
//!                                  │   ok  → stop old engine, start new one
//!                                  │   err → log, old engine keeps running
//!                                  │ Shutdown: stop engine, return
//! ```

use std::path::Path;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use crate::compositor::{Compositor, Layer};
use crate::config::AppConfig;
use crate::error::{Chain, EngineError};
use crate::scheduler::{WidgetRuntime, spawn_unit};
use crate::shutdown::{ControlEvent, Shutdown};
use crate::sources::{ProbeFactory, system_probe_factory};
use crate::transport::Transport;

/// Everything an engine needs besides its configuration.
///
/// Returned by [`Engine::stop`] so a reload can reuse it.
pub struct EngineOptions {
    pub probes: ProbeFactory,
    pub transport: Box<dyn Transport>,
}

impl EngineOptions {
    /// Host system probes delivering to `transport`.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            probes: system_probe_factory(),
            transport,
        }
    }

    #[must_use]
    pub fn with_probes(mut self, probes: ProbeFactory) -> Self {
        self.probes = probes;
        self
    }
}

/// One running configuration.
pub struct Engine {
    shutdown: Shutdown,
    probes: ProbeFactory,
    units: Vec<(String, JoinHandle<()>)>,
    compositor: Option<JoinHandle<Box<dyn Transport>>>,
}

impl Engine {
    /// Build every widget runtime, then start all threads.
    ///
    /// Widget construction happens before any thread is spawned, so an
    /// invalid widget never leaves half an engine running.
    pub fn start(config: &AppConfig, options: EngineOptions) -> Result<Self, EngineError> {
        let EngineOptions { probes, transport } = options;
        let placed = config.placed_widgets()?;

        let mut runtimes = Vec::with_capacity(placed.len());
        let mut layers = Vec::with_capacity(placed.len());
        for widget in &placed {
            let runtime = WidgetRuntime::new(&widget.spec, probes(widget.spec.kind()))?;
            layers.push(Layer {
                id: widget.spec.id.clone(),
                rect: widget.rect(),
                style: widget.spec.style,
                slot: runtime.slot(),
            });
            runtimes.push(runtime);
        }

        let disabled = config.widgets.len() - placed.len();
        let clipped = placed.iter().filter(|widget| widget.clipped).count();
        info!(
            widgets = placed.len(),
            disabled,
            clipped,
            display_w = config.display.width,
            display_h = config.display.height,
            layout = %config.layout.mode,
            refresh_ms = config.refresh_rate.as_millis() as u64,
            "starting engine"
        );

        let shutdown = Shutdown::new();
        let mut engine = Self {
            shutdown: shutdown.clone(),
            probes,
            units: Vec::with_capacity(runtimes.len()),
            compositor: None,
        };

        let period = config.refresh_rate;
        for runtime in runtimes {
            let id = runtime.id().to_owned();
            match spawn_unit(runtime, shutdown.clone(), period) {
                Ok(handle) => engine.units.push((id, handle)),
                Err(err) => {
                    engine.halt();
                    return Err(err.into());
                }
            }
        }

        let compositor = Compositor::new(
            config.layout.canvas_size(),
            config.display.background_color,
            config.layout.viewport,
            layers,
        )
        .with_dedup(config.dedup_frames);
        let spawned = thread::Builder::new().name(String::from("compositor")).spawn(move || {
            let mut transport = transport;
            compositor.run(transport.as_mut(), &shutdown, period);
            transport
        });
        match spawned {
            Ok(handle) => engine.compositor = Some(handle),
            Err(err) => {
                engine.halt();
                return Err(err.into());
            }
        }
        Ok(engine)
    }

    /// Token that stops this engine when requested.
    pub fn shutdown_token(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Stop every thread and hand back the options for the next engine.
    pub fn stop(mut self) -> Result<EngineOptions, EngineError> {
        self.shutdown.request();
        let mut first_panic = None;
        for (id, handle) in self.units.drain(..) {
            if handle.join().is_err() {
                error!(widget = %id, "widget unit panicked");
                first_panic.get_or_insert(id);
            }
        }

        let transport = match self.compositor.take().map(JoinHandle::join) {
            Some(Ok(transport)) => transport,
            Some(Err(_)) | None => {
                error!("compositor thread panicked");
                return Err(EngineError::Panicked(String::from("compositor")));
            }
        };
        if let Some(id) = first_panic {
            return Err(EngineError::Panicked(id));
        }

        info!("engine stopped");
        Ok(EngineOptions {
            probes: self.probes.clone(),
            transport,
        })
    }

    /// Request shutdown and join whatever has been spawned.
    fn halt(&mut self) {
        self.shutdown.request();
        for (_, handle) in self.units.drain(..) {
            let _ = handle.join();
        }
        if let Some(handle) = self.compositor.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !self.units.is_empty() || self.compositor.is_some() {
            self.halt();
        }
    }
}

/// Run engines until a shutdown event arrives or the event channel closes.
///
/// `Reload` re-reads `config_path`. A configuration that fails to load or
/// validate is logged and the running engine is left untouched.
pub fn supervise(
    config_path: &Path,
    config: &AppConfig,
    options: EngineOptions,
    events: &Receiver<ControlEvent>,
) -> Result<(), EngineError> {
    let mut engine = Engine::start(config, options)?;

    while let Ok(event) = events.recv() {
        match event {
            ControlEvent::Shutdown => break,
            ControlEvent::Reload => match AppConfig::load(config_path) {
                Ok(next) => {
                    let options = engine.stop()?;
                    engine = Engine::start(&next, options)?;
                    info!(path = %config_path.display(), "configuration reloaded");
                }
                Err(err) => {
                    warn!(error = %Chain(&err), "reload failed, keeping the running configuration");
                }
            },
        }
    }

    engine.stop().map(drop)
}

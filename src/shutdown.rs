//! Cooperative cancellation and process signal handling.
//!
//! [`Shutdown`] is a cloneable token shared by every scheduling unit and the
//! compositor. Units never sleep directly; they call
//! [`Shutdown::wait_timeout`], which returns early the moment shutdown is
//! requested, so the whole engine stops within one wake-up.
//!
//! On Unix, [`SignalGuard`] maps `SIGINT`/`SIGTERM` to
//! [`ControlEvent::Shutdown`] and `SIGHUP` to [`ControlEvent::Reload`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
struct Inner {
    requested: Mutex<bool>,
    cond: Condvar,
}

/// Cloneable shutdown token.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter.
    pub fn request(&self) {
        let mut requested = self.inner.requested.lock();
        *requested = true;
        self.inner.cond.notify_all();
    }

    pub fn is_requested(&self) -> bool {
        *self.inner.requested.lock()
    }

    /// Sleep for `timeout` unless shutdown is requested first.
    ///
    /// Returns `true` when shutdown was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut requested = self.inner.requested.lock();
        while !*requested {
            if self.inner.cond.wait_until(&mut requested, deadline).timed_out() {
                break;
            }
        }
        *requested
    }
}

/// Requests delivered to the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Shutdown,
    Reload,
}

#[cfg(unix)]
pub use self::signals::SignalGuard;

#[cfg(unix)]
mod signals {
    use std::io;
    use std::sync::mpsc::Sender;
    use std::thread::{self, JoinHandle};

    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::{Handle, Signals};
    use tracing::{info, warn};

    use super::ControlEvent;

    /// Forwards process signals as [`ControlEvent`]s until dropped.
    pub struct SignalGuard {
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    }

    impl SignalGuard {
        pub fn new(events: Sender<ControlEvent>) -> io::Result<Self> {
            let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP]).map_err(io::Error::other)?;
            let handle = signals.handle();
            let thread = thread::Builder::new().name(String::from("signals")).spawn(move || {
                for signal in signals.forever() {
                    let event = match signal {
                        SIGHUP => {
                            info!("SIGHUP received, reloading configuration");
                            ControlEvent::Reload
                        }
                        SIGINT | SIGTERM => {
                            warn!(signal, "termination signal received, shutting down");
                            ControlEvent::Shutdown
                        }
                        _ => continue,
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                }
            })?;
            Ok(Self {
                handle,
                thread: Some(thread),
            })
        }
    }

    impl Drop for SignalGuard {
        fn drop(&mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

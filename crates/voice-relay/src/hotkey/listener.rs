//! Global hotkey listener with a single dispatch loop.
//!
//! Callbacks run synchronously on the dispatch loop's thread: a callback that
//! blocks (a multi-second capture, say) holds back every later press until it
//! returns. Presses are dispatched in the order the backend reports them, with
//! no reordering or coalescing.

use crate::{
    AppError, AppResult,
    hotkey::{HotkeyBackend, HotkeyEvent, HotkeySpec},
};

use std::{
    any::Any,
    collections::BTreeMap,
    fmt,
    panic::{AssertUnwindSafe, Location},
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use error_location::ErrorLocation;
use global_hotkey::hotkey::HotKey;
use tracing::{debug, error, info, instrument, warn};

/// How often the loop wakes to check for a stop request.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long `stop_listening` waits for the dispatch thread.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Identifies a registered binding. Never reused within one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Binding {
    spec: String,
    hotkey: HotKey,
    callback: Callback,
}

type BindingTable = Arc<RwLock<BTreeMap<BindingId, Binding>>>;

/// Ends a running dispatch loop from any thread, including from a callback.
#[derive(Debug, Clone, Default)]
pub struct ListenerStopHandle {
    stopped: Arc<AtomicBool>,
}

impl ListenerStopHandle {
    /// Asks the loop to exit after the current dispatch.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested since the loop last started.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.stopped.store(false, Ordering::Release);
    }
}

/// Marks the listener as running; cleared when the loop ends.
struct ListeningClaim {
    listening: Arc<AtomicBool>,
}

impl ListeningClaim {
    #[track_caller]
    fn claim(listening: &Arc<AtomicBool>) -> AppResult<Self> {
        listening
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::ListenerAlreadyRunning {
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            listening: Arc::clone(listening),
        })
    }
}

impl Drop for ListeningClaim {
    fn drop(&mut self) {
        self.listening.store(false, Ordering::Release);
    }
}

struct Dispatcher {
    thread: JoinHandle<()>,
    done: Receiver<()>,
}

/// Owns a set of global hotkey bindings and dispatches their callbacks.
///
/// Bindings are only added or removed through `&mut self`, never from inside
/// the dispatch loop. Dropping the listener stops the loop and releases every
/// binding, newest first.
pub struct HotkeyListener<B: HotkeyBackend> {
    backend: B,
    bindings: BindingTable,
    next_id: u64,
    stop: ListenerStopHandle,
    listening: Arc<AtomicBool>,
    dispatcher: Option<Dispatcher>,
}

impl<B: HotkeyBackend> HotkeyListener<B> {
    /// Creates a listener with no bindings over `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            bindings: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: 0,
            stop: ListenerStopHandle::default(),
            listening: Arc::new(AtomicBool::new(false)),
            dispatcher: None,
        }
    }

    /// Parses `spec`, claims it with the OS, and stores `callback` for it.
    ///
    /// # Errors
    ///
    /// `ParseError` for an unresolvable spec, `RegistrationError` if the OS
    /// refuses the combination. Existing bindings are unaffected either way.
    #[track_caller]
    #[instrument(skip(self, callback))]
    pub fn register<F>(&mut self, spec: &str, callback: F) -> AppResult<BindingId>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let hotkey = HotkeySpec::parse(spec)?.hotkey();
        self.backend.register(hotkey)?;

        self.next_id += 1;
        let id = BindingId(self.next_id);

        self.bindings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                id,
                Binding {
                    spec: spec.to_string(),
                    hotkey,
                    callback: Arc::new(callback),
                },
            );

        info!(binding_id = %id, spec, "Hotkey binding registered");

        Ok(id)
    }

    /// Removes a binding and its OS registration. False if `id` is unknown.
    ///
    /// # Errors
    ///
    /// `RegistrationError` if the OS refuses the release; the binding is kept
    /// so a later call can retry.
    #[instrument(skip(self))]
    pub fn unregister(&mut self, id: BindingId) -> AppResult<bool> {
        let hotkey = self
            .bindings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .map(|binding| binding.hotkey);

        let Some(hotkey) = hotkey else {
            debug!(binding_id = %id, "Unknown binding");
            return Ok(false);
        };

        self.backend.unregister(hotkey)?;

        let removed = self
            .bindings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        if let Some(binding) = removed {
            info!(binding_id = %id, spec = %binding.spec, "Hotkey binding removed");
        }

        Ok(true)
    }

    /// Removes every binding, newest first.
    ///
    /// A binding the OS refuses to release is logged and kept.
    pub fn unregister_all(&mut self) {
        let ids: Vec<BindingId> = self
            .bindings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .rev()
            .copied()
            .collect();

        for id in ids {
            if let Err(e) = self.unregister(id) {
                warn!(binding_id = %id, error = ?e, "OS unregistration failed");
            }
        }
    }

    /// Runs the dispatch loop on the calling thread until stopped through a
    /// [`ListenerStopHandle`] or until the backend's event stream closes.
    ///
    /// # Errors
    ///
    /// `ListenerAlreadyRunning` if a loop is already active.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start_listening_blocking(&mut self) -> AppResult<()> {
        let _claim = ListeningClaim::claim(&self.listening)?;
        self.stop.reset();

        info!("Hotkey listener running on calling thread");
        dispatch_loop(&self.backend.events(), &self.bindings, &self.stop);
        info!("Hotkey listener stopped");

        Ok(())
    }

    /// Runs the dispatch loop on a dedicated thread and returns immediately.
    ///
    /// # Errors
    ///
    /// `ListenerAlreadyRunning` if a loop is already active, `IoError` if the
    /// thread cannot be spawned.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start_listening_async(&mut self) -> AppResult<()> {
        let claim = ListeningClaim::claim(&self.listening)?;
        self.stop.reset();

        if let Some(previous) = self.dispatcher.take() {
            let _ = previous.thread.join();
        }

        let events = self.backend.events();
        let bindings = Arc::clone(&self.bindings);
        let stop = self.stop.clone();
        let (done_tx, done) = crossbeam_channel::bounded(1);

        let thread = std::thread::Builder::new()
            .name("hotkey-dispatch".to_string())
            .spawn(move || {
                dispatch_loop(&events, &bindings, &stop);
                drop(claim);
                let _ = done_tx.send(());
            })?;

        self.dispatcher = Some(Dispatcher { thread, done });
        info!("Hotkey listener running on dispatch thread");

        Ok(())
    }

    /// Signals the loop to exit and waits up to two seconds for the dispatch
    /// thread. A thread stuck in a callback past that is detached.
    #[instrument(skip(self))]
    pub fn stop_listening(&mut self) {
        self.stop.stop();

        let Some(dispatcher) = self.dispatcher.take() else {
            return;
        };

        match dispatcher.done.recv_timeout(STOP_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if dispatcher.thread.join().is_err() {
                    warn!("Hotkey dispatch thread panicked");
                }
                info!("Hotkey listener stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = STOP_TIMEOUT.as_millis(),
                    "Hotkey dispatch thread did not stop in time, detaching"
                );
            }
        }
    }

    /// Whether a dispatch loop is currently running.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    /// Handle that ends the running loop.
    pub fn stop_handle(&self) -> ListenerStopHandle {
        self.stop.clone()
    }
}

impl<B: HotkeyBackend> Drop for HotkeyListener<B> {
    fn drop(&mut self) {
        self.stop_listening();
        self.unregister_all();
    }
}

fn dispatch_loop(events: &Receiver<HotkeyEvent>, bindings: &BindingTable, stop: &ListenerStopHandle) {
    while !stop.is_stopped() {
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(event) => dispatch(bindings, event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Hotkey event stream closed");
                break;
            }
        }
    }
}

fn dispatch(bindings: &BindingTable, event: HotkeyEvent) {
    // Callback is cloned out so the table is not locked while it runs.
    let target = bindings
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .find(|(_, binding)| binding.hotkey.id() == event.hotkey_id)
        .map(|(id, binding)| (*id, Arc::clone(&binding.callback)));

    let Some((id, callback)) = target else {
        debug!(hotkey_id = event.hotkey_id, "Ignoring event with no binding");
        return;
    };

    debug!(binding_id = %id, "Dispatching hotkey");

    if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| callback())) {
        error!(
            binding_id = %id,
            reason = %panic_message(payload.as_ref()),
            "Hotkey callback panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

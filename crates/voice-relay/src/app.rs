use crate::{
    AppResult, Orchestrator, OutputHandler, TriggerOutcome,
    config::Config,
    hotkey::{GlobalHotkeyBackend, HotkeyListener},
};

use std::sync::Arc;

use tracing::{debug, error, info, instrument};
use voice_relay_core::{KillHandle, Recorder, Transport, WorkerProcess};

/// Running application: the hotkey listener and what its callbacks drive.
///
/// Lives on the main thread, which owns the OS hotkey registrations.
pub struct App {
    listener: HotkeyListener<GlobalHotkeyBackend>,
    orchestrator: Arc<Orchestrator<WorkerProcess>>,
    worker_kill: KillHandle,
}

impl App {
    /// Starts the worker, registers the hotkeys, and begins listening.
    ///
    /// Must run on the thread that pumps the platform event loop.
    #[track_caller]
    #[instrument(skip(config))]
    pub fn start(config: &Config) -> AppResult<Self> {
        let capture = config.audio.capture_config()?;
        let record_for = config.audio.record_duration()?;

        let mut worker = WorkerProcess::new(config.worker.worker_config()?);
        worker.start()?;
        let worker_kill = worker.kill_handle();

        let orchestrator = Arc::new(Orchestrator::new(
            Recorder::new(config.audio.device()),
            capture,
            record_for,
            worker,
        ));

        let mut listener = HotkeyListener::new(GlobalHotkeyBackend::new()?);

        // Triggers run off the dispatch thread so the cancel hotkey is still
        // delivered while a capture is in progress.
        let trigger_orchestrator = Arc::clone(&orchestrator);
        let copy_to_clipboard = config.behavior.copy_to_clipboard;
        listener.register(&config.hotkeys.trigger, move || {
            spawn_trigger(Arc::clone(&trigger_orchestrator), copy_to_clipboard);
        })?;

        if let Some(spec) = config.hotkeys.cancel_spec() {
            let cancel_orchestrator = Arc::clone(&orchestrator);
            listener.register(spec, move || {
                cancel_orchestrator.cancel();
            })?;
        }

        listener.start_listening_async()?;

        info!(
            trigger = %config.hotkeys.trigger,
            cancel = ?config.hotkeys.cancel_spec(),
            "Voice-relay ready"
        );

        Ok(Self {
            listener,
            orchestrator,
            worker_kill,
        })
    }

    /// Tears down in dependency order: cancel the capture, stop listening,
    /// release the hotkeys, then stop the worker.
    #[instrument(skip(self))]
    pub fn shutdown(mut self) {
        self.orchestrator.cancel();
        self.listener.stop_listening();
        self.listener.unregister_all();
        stop_worker(&self.orchestrator, &self.worker_kill);

        info!("Voice-relay shut down");
    }
}

/// Stops the worker even while a trigger is blocked waiting on its reply.
///
/// The kill makes that `send` fail with `Io`, which releases the transport.
pub(crate) fn stop_worker(orchestrator: &Orchestrator<WorkerProcess>, kill: &KillHandle) {
    if kill.kill() {
        debug!("Worker killed for shutdown");
    }
    orchestrator.transport().stop();
}

fn spawn_trigger(orchestrator: Arc<Orchestrator<WorkerProcess>>, copy_to_clipboard: bool) {
    if orchestrator.is_busy() {
        debug!("Trigger ignored, previous one still running");
        return;
    }

    let spawned = std::thread::Builder::new()
        .name("trigger".to_string())
        .spawn(move || run_trigger(&orchestrator, copy_to_clipboard));

    if let Err(e) = spawned {
        error!(error = ?e, "Failed to spawn trigger thread");
    }
}

fn run_trigger<T: Transport>(orchestrator: &Orchestrator<T>, copy_to_clipboard: bool) {
    match orchestrator.trigger() {
        Ok(TriggerOutcome::Completed(reply)) => {
            info!(reply = %reply, "Result");
            if copy_to_clipboard {
                let copied = OutputHandler::new().and_then(|mut output| output.output_text(&reply));
                if let Err(e) = copied {
                    error!(error = ?e, "Failed to copy result to clipboard");
                }
            }
        }
        Ok(outcome) => debug!(?outcome, "Trigger finished without a result"),
        Err(e) => error!(error = ?e, "Trigger failed"),
    }
}

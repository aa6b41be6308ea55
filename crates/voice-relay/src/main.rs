//! Voice-relay: global hotkeys that capture audio and relay it to a worker
//! process.

mod app;
mod config;
mod error;
mod hotkey;
mod loop_command;
mod orchestrator;
mod output_handler;
mod recording_state;

pub(crate) use {
    app::App,
    error::{AppError, Result as AppResult},
    loop_command::LoopCommand,
    orchestrator::{Orchestrator, TriggerOutcome},
    output_handler::OutputHandler,
    recording_state::RecordingState,
};

use crate::config::Config;

use tao::{
    event::{Event, StartCause},
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "voice_relay=debug,voice_relay_core=debug";

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let event_loop = EventLoopBuilder::<LoopCommand>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    // App lives on the main thread - the hotkey manager must stay where the
    // event loop pumps platform messages.
    let mut app: Option<App> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                match App::start(&config) {
                    Ok(started) => app = Some(started),
                    Err(e) => {
                        error!("Failed to start: {:?}", e);
                        std::process::exit(1);
                    }
                }

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                spawn_ctrl_c_watcher(proxy.clone());
            }
            Event::UserEvent(LoopCommand::Shutdown) => {
                if let Some(running) = app.take() {
                    running.shutdown();
                }
                *control_flow = ControlFlow::ExitWithCode(0);
            }
            _ => {}
        }
    });
}

/// Posts `Shutdown` to the event loop on Ctrl+C.
fn spawn_ctrl_c_watcher(proxy: EventLoopProxy<LoopCommand>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime: {:?}", e);
                return;
            }
        };

        rt.block_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl+C received, shutting down");
                    if proxy.send_event(LoopCommand::Shutdown).is_err() {
                        warn!("Event loop already closed");
                    }
                }
                Err(e) => error!(error = ?e, "Failed to listen for Ctrl+C"),
            }
        });
    });
}

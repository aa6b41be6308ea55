//! OS hotkey registration behind a small capability trait.

use crate::{AppError, AppResult};

use std::panic::Location;

use crossbeam_channel::{Receiver, Sender};
use error_location::ErrorLocation;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};
use tracing::{debug, info, instrument};

/// A press of a registered hotkey, identified by `HotKey::id()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyEvent {
    /// Id of the hotkey that fired.
    pub hotkey_id: u32,
}

/// Registers hotkeys with the OS and reports presses in delivery order.
pub trait HotkeyBackend {
    /// Claims `hotkey` system-wide.
    ///
    /// # Errors
    ///
    /// `RegistrationError` if the OS refuses it.
    fn register(&mut self, hotkey: HotKey) -> AppResult<()>;

    /// Releases a previously registered hotkey.
    ///
    /// # Errors
    ///
    /// `RegistrationError` if the OS refuses it.
    fn unregister(&mut self, hotkey: HotKey) -> AppResult<()>;

    /// Stream of presses for every registered hotkey.
    fn events(&self) -> Receiver<HotkeyEvent>;
}

/// [`HotkeyBackend`] backed by `global-hotkey`.
///
/// Must be created on a thread with a message pump (the main thread running
/// the `tao` event loop) so that the OS delivers hotkey messages.
pub struct GlobalHotkeyBackend {
    manager: GlobalHotKeyManager,
    events: Receiver<HotkeyEvent>,
}

impl GlobalHotkeyBackend {
    /// Creates the manager and routes presses into this backend's channel.
    ///
    /// Installs the process-wide `global-hotkey` event handler; only one
    /// backend should exist at a time.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let manager = GlobalHotKeyManager::new().map_err(|e| AppError::RegistrationError {
            reason: format!("Failed to create manager: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let (tx, events) = crossbeam_channel::unbounded();
        GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
            forward_press(&tx, event);
        }));

        info!("Global hotkey backend ready");

        Ok(Self { manager, events })
    }
}

fn forward_press(tx: &Sender<HotkeyEvent>, event: GlobalHotKeyEvent) {
    if event.state == HotKeyState::Pressed {
        let _ = tx.send(HotkeyEvent { hotkey_id: event.id });
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    #[track_caller]
    fn register(&mut self, hotkey: HotKey) -> AppResult<()> {
        self.manager
            .register(hotkey)
            .map_err(|e| AppError::RegistrationError {
                reason: format!("Failed to register {:?}: {}", hotkey, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(hotkey_id = hotkey.id(), "Hotkey registered with OS");

        Ok(())
    }

    #[track_caller]
    fn unregister(&mut self, hotkey: HotKey) -> AppResult<()> {
        self.manager
            .unregister(hotkey)
            .map_err(|e| AppError::RegistrationError {
                reason: format!("Failed to unregister {:?}: {}", hotkey, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(hotkey_id = hotkey.id(), "Hotkey released");

        Ok(())
    }

    fn events(&self) -> Receiver<HotkeyEvent> {
        self.events.clone()
    }
}

impl Drop for GlobalHotkeyBackend {
    fn drop(&mut self) {
        GlobalHotKeyEvent::set_event_handler(None::<fn(GlobalHotKeyEvent)>);
    }
}

mod backend;
mod hotkey_spec;
mod listener;

pub(crate) use {
    backend::{GlobalHotkeyBackend, HotkeyBackend, HotkeyEvent},
    hotkey_spec::HotkeySpec,
    listener::HotkeyListener,
};

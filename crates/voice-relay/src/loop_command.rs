/// Commands posted to the main thread's event loop.
///
/// The main thread owns the hotkey registrations, so process lifecycle events
/// flow through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    /// Tear the application down and exit the event loop.
    Shutdown,
}

/// What happened during one tick that may need the main loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeSources {
    /// A rotary step was recognised on this tick.
    pub rotation: bool,
    /// Either button changed level on this tick.
    pub button_edge: bool,
    /// At least one timeout reached zero on this tick.
    pub timeout: bool,
    /// An ongoing animation flag is set.
    pub ongoing: bool,
}

/// Decide whether the sleeping main loop must run after this tick.
///
/// Ongoing flags alone are enough: as long as the main loop keeps one set,
/// it is woken on every tick without ever polling.
pub fn should_wake(sources: WakeSources) -> bool {
    sources.rotation || sources.button_edge || sources.timeout || sources.ongoing
}

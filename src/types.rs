use serde::Deserialize;

/// Lifecycle bucket shared by content states and job states.
///
/// - `Pending`: more transitions are expected; keep polling.
/// - `TerminalOk`: finished, nothing more to wait for.
/// - `TerminalError`: finished in a failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateClass {
    Pending,
    TerminalOk,
    TerminalError,
}

impl StateClass {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StateClass::Pending)
    }
}

/// How the polling interval grows across consecutive unchanged ticks.
///
/// - `Linear`: `initial + n * step`.
/// - `Exponential`: `initial * factor^n`.
///
/// Both are capped at the configured maximum interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Linear,
    Exponential,
}

impl Default for BackoffKind {
    fn default() -> Self {
        BackoffKind::Exponential
    }
}

/// Recorder state machine.
///
/// ```text
/// idle → recording → finalized (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Finalized,
}

impl RecorderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized)
    }
}

/// Delay-loop state machine.
///
/// ```text
/// setup → running → stopped (terminal)
/// ```
///
/// The transition to `Stopped` happens on the first of: stop flag set,
/// fatal device error, fatal demux error. Shutdown runs on all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Setup,
    Running,
    Stopped,
}

impl LoopState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

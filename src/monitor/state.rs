use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    #[default]
    Idle,
    Scheduled,
    Updating,
}

impl SchedulerState {
    fn as_u8(self) -> u8 {
        match self {
            SchedulerState::Idle => 0,
            SchedulerState::Scheduled => 1,
            SchedulerState::Updating => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SchedulerState::Scheduled,
            2 => SchedulerState::Updating,
            _ => SchedulerState::Idle,
        }
    }
}

/// Lock-free holder for [`SchedulerState`]; every transition is a single
/// compare-and-swap so two fires can never both enter `Updating`.
#[derive(Debug, Default)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> SchedulerState {
        SchedulerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Idle -> Scheduled.
    pub fn start(&self) -> bool {
        self.transition(SchedulerState::Idle, SchedulerState::Scheduled)
    }

    /// Scheduled -> Updating. Fails when idle or already updating.
    pub fn begin_update(&self) -> bool {
        self.transition(SchedulerState::Scheduled, SchedulerState::Updating)
    }

    /// Updating -> Scheduled. Fails if the scheduler was stopped mid-cycle.
    pub fn finish_update(&self) -> bool {
        self.transition(SchedulerState::Updating, SchedulerState::Scheduled)
    }

    /// Any -> Idle, returning the state that was left.
    pub fn stop(&self) -> SchedulerState {
        SchedulerState::from_u8(self.0.swap(SchedulerState::Idle.as_u8(), Ordering::AcqRel))
    }

    fn transition(&self, from: SchedulerState, to: SchedulerState) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

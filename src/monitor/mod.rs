pub mod composer;
pub mod context;
pub mod diff;
pub mod history;
pub mod observer;
pub mod scheduler;
pub mod state;

pub use context::MonitorContext;
pub use diff::{diff_applications, diff_browser_states, AppTransition, TabTransition, Transition};
pub use history::EventHistory;
pub use observer::{EventDispatcher, RecordedEventObserver};
pub use scheduler::{UpdateScheduler, DEFAULT_CHECK_INTERVAL_SECS};
pub use state::SchedulerState;

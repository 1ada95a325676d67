mod application;
mod events;
mod tab;

pub use application::{RunningApplication, RunningApplicationCollection};
pub use events::{format_duration, ApplicationEvent, BrowserEvent, RecordedEvent};
pub use tab::{BrowserState, Tab, UNTITLED_TAB};

mod file;
mod lifecycle;

pub use file::{File, FileType, NewFile};
pub use lifecycle::{transition, FileState, LifecycleEvent};

pub mod critical_path;
pub mod dependency;
pub mod error;
pub mod hierarchy;
pub mod manager;
pub mod progress;
pub mod types;


pub use critical_path::{CriticalPath, TaskSchedule};
pub use dependency::*;
pub use error::*;
pub use hierarchy::*;
pub use manager::*;
pub use progress::{AreaProgress, ProjectProgress, calculate_progress};
pub use types::*;

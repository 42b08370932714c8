pub mod board;
pub mod project;
pub mod task;

pub use board::TaskBoard;
pub use project::Project;
pub use task::Task;

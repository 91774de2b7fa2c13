//! Utility modules for carlot-intake

pub mod async_task;

pub use async_task::{AsyncTask, TaskOutcome, TaskState, TaskStatus};

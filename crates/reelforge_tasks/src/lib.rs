//! Task tracking and background execution.
//!
//! - [`TaskRegistry`] creates tasks and enforces their lifecycle
//! - [`InMemoryTaskRepository`] is the default task store
//! - [`poll_until_complete`] drives asynchronous provider jobs to completion
//! - [`JobExecutor`] runs background jobs with bounded concurrency and queue depth

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod executor;
mod memory;
mod poller;
mod registry;

pub use executor::{ExecutorConfig, JobExecutor, JobSlot};
pub use memory::InMemoryTaskRepository;
pub use poller::{PollConfig, poll_until_complete};
pub use registry::TaskRegistry;

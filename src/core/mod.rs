pub mod discovery;
pub mod engine;
pub mod fetcher;
pub mod flatten;
pub mod scheduler;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{FlatRow, PageResult, RawRecord, RunProgress, RunSummary};
pub use crate::domain::ports::{ConfigProvider, Transport};
pub use crate::utils::error::Result;

pub mod etl;
pub mod extract;
pub mod load;
pub mod schema;
pub mod transform;

pub use crate::domain::model::{Column, DataType, TabularDataset, Value};
pub use crate::domain::ports::{ConfigProvider, EventLog};
pub use crate::utils::error::Result;
pub use etl::{PipelineRunner, RunState, RunSummary, Stage};

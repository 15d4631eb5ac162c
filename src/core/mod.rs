pub mod codec;
pub mod exchange;
pub mod registry;

pub use crate::domain::model::Document;
pub use crate::domain::ports::{ConfigProvider, Format, FormatAdapter, Storage, UnknownRecordPolicy};
pub use crate::utils::error::Result;

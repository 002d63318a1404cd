//! Record Manager layer (spec §4.3): tables of fixed-length records laid
//! out into bitmap-slotted pages, plus filtered scans over them.

pub mod bitmap;
pub mod page;
pub mod rid;
pub mod schema;
pub mod scan;
pub mod table;

pub use rid::{Record, Rid};
pub use schema::{Attribute, DataType, Schema};
pub use scan::Scan;
pub use table::Table;

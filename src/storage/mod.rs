//! Storage Manager layer (spec §4.1).

mod page_file;

pub use page_file::{create_page_file, destroy_page_file, PageFile};

//! The record manager's sole external collaborator boundary: callers
//! supply a `Predicate` to filter a scan. No implementation ships with
//! this crate — building and evaluating expressions against a schema is
//! someone else's layer.

use crate::record::rid::Record;
use crate::record::schema::Schema;

/// A scan filter evaluated once per live record.
pub trait Predicate {
    /// Returns `true` if `record` should be returned by the scan. An
    /// absent predicate (spec §9's Open Question) matches every live
    /// record, which is modeled here as `Option<Box<dyn Predicate>>`
    /// being `None` rather than a trivial always-true implementation.
    fn matches(&self, record: &Record, schema: &Schema) -> bool;
}

//! A teaching-grade relational database's storage kernel: a layered
//! engine that turns record-level operations (insert, delete, update,
//! get, scan) into block-aligned reads and writes against an on-disk
//! page file.
//!
//! Three layers stack bottom-up, each depending only on the layer below:
//!
//! - [`storage`] — the Storage Manager: a page file as a sequence of
//!   fixed-size blocks, with absolute and relative block I/O.
//! - [`buffer`] — the Buffer Manager: a bounded pool of cached pages with
//!   pin/unpin/markDirty/forcePage and a pluggable eviction policy
//!   (FIFO, LRU, CLOCK, LFU).
//! - [`record`] — the Record Manager: fixed-length records laid out into
//!   bitmap-slotted pages with a free-page list, plus filtered scans.
//!
//! The record manager's only external collaborator is an opaque
//! [`predicate::Predicate`]; building and evaluating expressions is out
//! of scope for this crate.
//!
//! Transactions, cross-process concurrency, crash recovery/WAL, indexes,
//! variable-length records, compression, multi-file databases, and query
//! optimization are explicit non-goals.

pub mod buffer;
pub mod common;
pub mod error;
pub mod predicate;
pub mod record;
pub mod storage;

pub use error::{DbError, DbResult};

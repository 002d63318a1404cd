//! Compile-time constants shared by every layer of the kernel.

/// Size in bytes of one page. All persistent structures are multiples of
/// this.
pub const PAGE_SIZE: usize = 4096;

/// Page number type. Page numbers are dense and start at 0.
pub type PageNum = u32;

/// Frame index within a buffer pool's frame array.
pub type FrameId = usize;

/// Slot index within a data page.
pub type SlotNum = u16;

/// Sentinel meaning "no page"/"no link" wherever a page number is used as an
/// optional pointer (e.g. the free-page list, an empty frame).
pub const NO_PAGE: PageNum = 0;

/// Default number of frames a record-manager table's buffer pool is given
/// when the caller does not request a specific size.
pub const DEFAULT_POOL_SIZE: usize = 1000;

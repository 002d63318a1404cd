pub mod config;

pub use config::{FrameId, PageNum, SlotNum, DEFAULT_POOL_SIZE, NO_PAGE, PAGE_SIZE};

/// A page's fixed-size byte buffer, boxed so a `Page`/`Frame` can be moved
/// around without copying 4KiB on the stack.
pub type PageBuf = Box<[u8; PAGE_SIZE]>;

/// Allocate a zeroed page buffer.
pub fn zeroed_page() -> PageBuf {
    Box::new([0u8; PAGE_SIZE])
}

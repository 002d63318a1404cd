//! Buffer Manager: a fixed-size pool of frames caching pages from one page
//! file, with pin/unpin/markDirty/forcePage and a pluggable replacement
//! policy (spec §4.2).

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::buffer::replacer::{ReplacementPolicy, Strategy};
use crate::common::{zeroed_page, FrameId, PageBuf, PageNum, PAGE_SIZE};
use crate::error::{DbError, DbResult};
use crate::storage::PageFile;

/// A page-sized in-memory buffer with its bookkeeping metadata.
struct Frame {
    page_num: Option<PageNum>,
    fix_count: i32,
    dirty: bool,
    data: PageBuf,
}

impl Frame {
    fn empty() -> Self {
        Self {
            page_num: None,
            fix_count: 0,
            dirty: false,
            data: zeroed_page(),
        }
    }
}

/// A handle to a pinned page, returned by `pin_page`. The caller threads
/// this back through `unpin_page`/`mark_dirty`/`force_page`; it borrows
/// the frame's bytes through `data`/`data_mut` on the owning pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    pub page_num: PageNum,
    frame_id: FrameId,
}

pub struct BufferPool {
    file: PageFile,
    frames: Vec<Frame>,
    page_table: HashMap<PageNum, FrameId>,
    free_list: Vec<FrameId>,
    replacer: ReplacementPolicy,
    read_io: u64,
    write_io: u64,
    next_page_id: PageNum,
}

impl BufferPool {
    /// Initializes a pool of `num_frames` frames over an already-existing
    /// page file. Fails `InvalidPageNumber` if `num_frames < 1`,
    /// `FileNotFound` if the file is inaccessible.
    pub fn init(file_name: &str, num_frames: usize, strategy: Strategy) -> DbResult<Self> {
        if num_frames < 1 {
            return Err(DbError::InvalidPageNumber(num_frames as i64));
        }
        let file = PageFile::open(file_name)?;
        let next_page_id = file.total_num_pages() as PageNum;
        let frames = (0..num_frames).map(|_| Frame::empty()).collect();
        let free_list = (0..num_frames).rev().collect();
        Ok(Self {
            file,
            frames,
            page_table: HashMap::new(),
            free_list,
            replacer: ReplacementPolicy::new(strategy, num_frames),
            read_io: 0,
            write_io: 0,
            next_page_id,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    /// Hands out the next never-before-used page number. The record
    /// manager calls this when the free-page list is empty and a data
    /// page must be appended; the number becomes resident (as a
    /// zero-filled frame) the moment it is first pinned.
    pub fn allocate_page(&mut self) -> PageNum {
        let id = self.next_page_id;
        self.next_page_id += 1;
        id
    }

    /// One past the highest page number ever handed out by
    /// [`BufferPool::allocate_page`] (or, if nothing has been allocated
    /// yet, the file's page count at open time). A scan uses this as its
    /// upper bound instead of the on-disk file length, since a freshly
    /// allocated page may still be sitting dirty in a frame.
    pub fn next_page_id(&self) -> PageNum {
        self.next_page_id
    }

    // --- statistics views -------------------------------------------------

    pub fn get_frame_contents(&self) -> Vec<Option<PageNum>> {
        self.frames.iter().map(|f| f.page_num).collect()
    }

    pub fn get_dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    pub fn get_fix_counts(&self) -> Vec<i32> {
        self.frames.iter().map(|f| f.fix_count).collect()
    }

    pub fn get_num_read_io(&self) -> u64 {
        self.read_io
    }

    pub fn get_num_write_io(&self) -> u64 {
        self.write_io
    }

    // --- page data access ---------------------------------------------

    pub fn data(&self, handle: &PageHandle) -> &[u8; PAGE_SIZE] {
        &self.frames[handle.frame_id].data
    }

    pub fn data_mut(&mut self, handle: &PageHandle) -> &mut [u8; PAGE_SIZE] {
        &mut self.frames[handle.frame_id].data
    }

    fn write_frame_to_disk(&mut self, frame_id: FrameId) -> DbResult<()> {
        let frame = &self.frames[frame_id];
        let page_num = frame.page_num.expect("write_frame_to_disk on empty frame");
        self.file.write_block(page_num, &frame.data)?;
        self.write_io += 1;
        self.frames[frame_id].dirty = false;
        Ok(())
    }

    /// Picks a victim frame: an empty frame first, else a frame chosen by
    /// the replacement policy. Fails `NoFrameAvailable` if every frame is
    /// pinned.
    fn find_victim(&mut self) -> DbResult<FrameId> {
        if let Some(frame_id) = self.free_list.pop() {
            return Ok(frame_id);
        }
        let fix_counts = self.get_fix_counts();
        let frame_id = self
            .replacer
            .choose_victim(&fix_counts)
            .ok_or(DbError::NoFrameAvailable)?;
        if self.frames[frame_id].dirty {
            self.write_frame_to_disk(frame_id)?;
        }
        if let Some(old_page) = self.frames[frame_id].page_num {
            self.page_table.remove(&old_page);
        }
        self.replacer.remove(frame_id);
        Ok(frame_id)
    }

    /// Pins `page_num`, guaranteeing some frame holds its contents with
    /// its fix count incremented by one (spec §4.2's four-step protocol).
    pub fn pin_page(&mut self, page_num: PageNum) -> DbResult<PageHandle> {
        if let Some(&frame_id) = self.page_table.get(&page_num) {
            self.frames[frame_id].fix_count += 1;
            self.replacer.pin(frame_id);
            trace!(page_num, frame_id, "pin hit");
            return Ok(PageHandle { page_num, frame_id });
        }

        let frame_id = self.find_victim()?;

        if page_num < self.file.total_num_pages() as PageNum {
            self.file.read_block(page_num, &mut self.frames[frame_id].data)?;
            self.read_io += 1;
        } else {
            self.frames[frame_id].data.fill(0);
        }

        self.frames[frame_id].page_num = Some(page_num);
        self.frames[frame_id].fix_count = 1;
        self.frames[frame_id].dirty = false;
        self.page_table.insert(page_num, frame_id);
        self.replacer.pin(frame_id);
        debug!(page_num, frame_id, "pin fault");

        Ok(PageHandle { page_num, frame_id })
    }

    /// Decrements the fix count of the resident frame for
    /// `handle.page_num`. `PageNotFound` if the page is not resident
    /// (spec §9's Open Question: a non-resident unpin is an error here,
    /// not a silent no-op).
    pub fn unpin_page(&mut self, handle: &PageHandle) -> DbResult<()> {
        let frame_id = *self
            .page_table
            .get(&handle.page_num)
            .ok_or(DbError::PageNotFound)?;
        if self.frames[frame_id].fix_count > 0 {
            self.frames[frame_id].fix_count -= 1;
        }
        Ok(())
    }

    pub fn mark_dirty(&mut self, handle: &PageHandle) -> DbResult<()> {
        let frame_id = *self
            .page_table
            .get(&handle.page_num)
            .ok_or(DbError::PageNotFound)?;
        self.frames[frame_id].dirty = true;
        Ok(())
    }

    /// Writes the resident frame's bytes to disk regardless of the dirty
    /// flag, then clears it.
    pub fn force_page(&mut self, handle: &PageHandle) -> DbResult<()> {
        let frame_id = *self
            .page_table
            .get(&handle.page_num)
            .ok_or(DbError::PageNotFound)?;
        self.file.write_block(handle.page_num, &self.frames[frame_id].data)?;
        self.write_io += 1;
        self.frames[frame_id].dirty = false;
        Ok(())
    }

    /// Writes every dirty frame with `fix_count == 0` back to disk.
    pub fn force_flush_pool(&mut self) -> DbResult<()> {
        let candidates: Vec<FrameId> = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.dirty && f.fix_count == 0)
            .map(|(i, _)| i)
            .collect();
        for frame_id in candidates {
            self.write_frame_to_disk(frame_id)?;
        }
        Ok(())
    }

    /// Flushes the pool, then refuses if any frame is still pinned.
    pub fn shutdown(&mut self) -> DbResult<()> {
        self.force_flush_pool()?;
        if self.frames.iter().any(|f| f.fix_count > 0) {
            return Err(DbError::FileNotClosed);
        }
        self.replacer.free();
        self.page_table.clear();
        Ok(())
    }
}

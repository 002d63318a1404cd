//! Record Manager: fixed-length slotted-record tables built on top of the
//! buffer pool (spec §4.3).
//!
//! The table header occupies page 0:
//!
//! ```text
//! recordSize (u16) | numTuples (u32) | nextFreePage (u32)
//! | numSlotsPerPage (u16) | schemaSize (u16) | schema blob
//! ```
//!
//! Free data pages (at least one empty slot) form a doubly linked list
//! rooted at the header's `nextFreePage`; page 0 never appears in it.
//! `insertRecord` always draws from the list head; `deleteRecord` only
//! ever pushes a page back onto the head the moment it stops being full
//! (a page already in the list, not at the head, is left where it is).

use std::path::Path;

use tracing::debug;

use crate::buffer::{BufferPool, PageHandle, Strategy};
use crate::common::{zeroed_page, PageNum, SlotNum, DEFAULT_POOL_SIZE, PAGE_SIZE};
use crate::error::{DbError, DbResult};
use crate::record::bitmap::Bitmap;
use crate::record::page;
use crate::record::rid::{Record, Rid};
use crate::record::schema::Schema;
use crate::storage::{create_page_file, destroy_page_file, PageFile};

const HDR_RECORD_SIZE: usize = 0;
const HDR_NUM_TUPLES: usize = 2;
const HDR_NEXT_FREE: usize = 6;
const HDR_NUM_SLOTS: usize = 10;
const HDR_SCHEMA_SIZE: usize = 12;
const HDR_FIXED_LEN: usize = 14;

fn header_record_size(buf: &[u8; PAGE_SIZE]) -> u16 {
    u16::from_le_bytes(buf[HDR_RECORD_SIZE..HDR_RECORD_SIZE + 2].try_into().unwrap())
}

fn header_num_tuples(buf: &[u8; PAGE_SIZE]) -> u32 {
    u32::from_le_bytes(buf[HDR_NUM_TUPLES..HDR_NUM_TUPLES + 4].try_into().unwrap())
}

fn header_set_num_tuples(buf: &mut [u8; PAGE_SIZE], v: u32) {
    buf[HDR_NUM_TUPLES..HDR_NUM_TUPLES + 4].copy_from_slice(&v.to_le_bytes());
}

fn header_next_free(buf: &[u8; PAGE_SIZE]) -> PageNum {
    u32::from_le_bytes(buf[HDR_NEXT_FREE..HDR_NEXT_FREE + 4].try_into().unwrap())
}

fn header_set_next_free(buf: &mut [u8; PAGE_SIZE], v: PageNum) {
    buf[HDR_NEXT_FREE..HDR_NEXT_FREE + 4].copy_from_slice(&v.to_le_bytes());
}

fn header_num_slots(buf: &[u8; PAGE_SIZE]) -> u16 {
    u16::from_le_bytes(buf[HDR_NUM_SLOTS..HDR_NUM_SLOTS + 2].try_into().unwrap())
}

fn header_schema_size(buf: &[u8; PAGE_SIZE]) -> u16 {
    u16::from_le_bytes(buf[HDR_SCHEMA_SIZE..HDR_SCHEMA_SIZE + 2].try_into().unwrap())
}

/// An open table: its schema plus the buffer pool backing its page file.
pub struct Table {
    pub(crate) pool: BufferPool,
    pub(crate) schema: Schema,
    pub(crate) record_size: u16,
    pub(crate) num_slots_per_page: u16,
}

impl Table {
    /// Creates a new, empty table file. Fails `FileAlreadyExists` if
    /// `name` already exists.
    pub fn create(name: &str, schema: &Schema) -> DbResult<()> {
        if Path::new(name).exists() {
            return Err(DbError::FileAlreadyExists);
        }
        let record_size = schema.record_size();
        let num_slots_per_page = page::num_slots_per_page(record_size);
        let blob = schema.encode();
        if HDR_FIXED_LEN + blob.len() > PAGE_SIZE {
            return Err(DbError::InitError("schema too large for header page".into()));
        }

        create_page_file(name)?;
        let mut file = PageFile::open(name)?;
        let mut buf = zeroed_page();
        buf[HDR_RECORD_SIZE..HDR_RECORD_SIZE + 2].copy_from_slice(&record_size.to_le_bytes());
        header_set_num_tuples(&mut buf, 0);
        header_set_next_free(&mut buf, 0);
        buf[HDR_NUM_SLOTS..HDR_NUM_SLOTS + 2].copy_from_slice(&num_slots_per_page.to_le_bytes());
        buf[HDR_SCHEMA_SIZE..HDR_SCHEMA_SIZE + 2].copy_from_slice(&(blob.len() as u16).to_le_bytes());
        buf[HDR_FIXED_LEN..HDR_FIXED_LEN + blob.len()].copy_from_slice(&blob);
        file.write_block(0, &buf)?;
        file.close()?;
        debug!(name, record_size, num_slots_per_page, "created table");
        Ok(())
    }

    /// Opens an existing table, initializing its buffer pool (default
    /// pool size, LRU replacement, per spec §4.3).
    pub fn open(name: &str) -> DbResult<Self> {
        Self::open_with(name, DEFAULT_POOL_SIZE, Strategy::Lru)
    }

    /// Opens an existing table with a caller-chosen pool size and
    /// replacement strategy.
    pub fn open_with(name: &str, pool_size: usize, strategy: Strategy) -> DbResult<Self> {
        let mut pool = BufferPool::init(name, pool_size, strategy)?;
        let header = pool.pin_page(0)?;
        let buf = *pool.data(&header);
        pool.unpin_page(&header)?;

        let record_size = header_record_size(&buf);
        let num_slots_per_page = header_num_slots(&buf);
        let schema_size = header_schema_size(&buf) as usize;
        let (schema, _) = Schema::decode(&buf[HDR_FIXED_LEN..HDR_FIXED_LEN + schema_size])?;

        Ok(Self {
            pool,
            schema,
            record_size,
            num_slots_per_page,
        })
    }

    /// Flushes and closes the table's buffer pool. Fails `FileNotClosed`
    /// if any page is still pinned (e.g. an open scan).
    pub fn close(mut self) -> DbResult<()> {
        self.pool.shutdown()
    }

    /// Deletes a table's backing file. The table must not be open.
    pub fn delete(name: &str) -> DbResult<()> {
        destroy_page_file(name)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn record_size(&self) -> u16 {
        self.record_size
    }

    pub fn num_slots_per_page(&self) -> u16 {
        self.num_slots_per_page
    }

    pub fn get_num_tuples(&mut self) -> DbResult<u32> {
        let header = self.pool.pin_page(0)?;
        let n = header_num_tuples(self.pool.data(&header));
        self.pool.unpin_page(&header)?;
        Ok(n)
    }

    fn slot_bitmap(&self, handle: &PageHandle) -> Bitmap {
        page::read_bitmap(self.pool.data(handle), self.num_slots_per_page)
    }

    fn write_slot_bitmap(&mut self, handle: &PageHandle, bitmap: &Bitmap) {
        page::write_bitmap(self.pool.data_mut(handle), self.num_slots_per_page, bitmap);
    }

    /// Links `page_handle` in as the new free-list head, ahead of whatever
    /// the header currently points to.
    fn push_free_head(&mut self, header: &PageHandle, page_handle: &PageHandle) -> DbResult<()> {
        let old_head = header_next_free(self.pool.data(header));

        let buf = self.pool.data_mut(page_handle);
        page::set_prev_free_page(buf, 0);
        page::set_next_free_page(buf, old_head);
        self.pool.mark_dirty(page_handle)?;

        if old_head != 0 {
            let old_head_handle = self.pool.pin_page(old_head)?;
            page::set_prev_free_page(self.pool.data_mut(&old_head_handle), page_handle.page_num);
            self.pool.mark_dirty(&old_head_handle)?;
            self.pool.unpin_page(&old_head_handle)?;
        }

        header_set_next_free(self.pool.data_mut(header), page_handle.page_num);
        self.pool.mark_dirty(header)?;
        Ok(())
    }

    /// Detaches the current free-list head (`page_handle`, which must be
    /// the head) from the list, promoting its successor.
    fn detach_free_head(&mut self, header: &PageHandle, page_handle: &PageHandle) -> DbResult<()> {
        let next = page::next_free_page(self.pool.data(page_handle));
        if next != 0 {
            let next_handle = self.pool.pin_page(next)?;
            page::set_prev_free_page(self.pool.data_mut(&next_handle), 0);
            self.pool.mark_dirty(&next_handle)?;
            self.pool.unpin_page(&next_handle)?;
        }
        header_set_next_free(self.pool.data_mut(header), next);
        self.pool.mark_dirty(header)?;
        Ok(())
    }

    /// Inserts `record` into the first available slot, filling in its
    /// `id` on success (spec §4.3's insertRecord algorithm).
    pub fn insert_record(&mut self, record: &mut Record) -> DbResult<()> {
        if record.data.len() != self.record_size as usize {
            return Err(DbError::InvalidAttribute(0));
        }

        let header = self.pool.pin_page(0)?;
        let head = header_next_free(self.pool.data(&header));

        let (page_handle, page_num, is_new_page) = if head == 0 {
            let new_page = self.pool.allocate_page();
            let ph = self.pool.pin_page(new_page)?;
            page::init_empty_page(self.pool.data_mut(&ph), self.num_slots_per_page);
            self.pool.mark_dirty(&ph)?;
            (ph, new_page, true)
        } else {
            let ph = self.pool.pin_page(head)?;
            (ph, head, false)
        };

        if is_new_page {
            self.push_free_head(&header, &page_handle)?;
        }

        let mut bitmap = self.slot_bitmap(&page_handle);
        let slot = bitmap.first_clear().ok_or(DbError::NoFreePages)? as SlotNum;
        page::write_slot(
            self.pool.data_mut(&page_handle),
            self.num_slots_per_page,
            self.record_size,
            slot,
            &record.data,
        );
        bitmap.set(slot as u32);
        let now_full = bitmap.is_full();
        self.write_slot_bitmap(&page_handle, &bitmap);
        self.pool.mark_dirty(&page_handle)?;
        record.id = Rid::new(page_num, slot);

        if now_full {
            self.detach_free_head(&header, &page_handle)?;
        }

        let num_tuples = header_num_tuples(self.pool.data(&header)) + 1;
        header_set_num_tuples(self.pool.data_mut(&header), num_tuples);
        self.pool.mark_dirty(&header)?;

        self.pool.unpin_page(&page_handle)?;
        self.pool.unpin_page(&header)?;
        debug!(page = page_num, slot, "inserted record");
        Ok(())
    }

    /// Looks up the occupied slot named by `id`. `InvalidSlot` if `id`
    /// does not name a currently occupied slot.
    pub fn get_record(&mut self, id: Rid) -> DbResult<Record> {
        let ph = self.pool.pin_page(id.page)?;
        let bitmap = self.slot_bitmap(&ph);
        if id.slot as u32 >= bitmap.bits() || !bitmap.get(id.slot as u32) {
            self.pool.unpin_page(&ph)?;
            return Err(DbError::InvalidSlot(id.slot, id.page));
        }
        let data = page::read_slot(self.pool.data(&ph), self.num_slots_per_page, self.record_size, id.slot).to_vec();
        self.pool.unpin_page(&ph)?;
        Ok(Record { id, data })
    }

    /// Overwrites the bytes of an already-occupied slot in place.
    pub fn update_record(&mut self, record: &Record) -> DbResult<()> {
        if record.data.len() != self.record_size as usize {
            return Err(DbError::InvalidAttribute(0));
        }
        let id = record.id;
        let ph = self.pool.pin_page(id.page)?;
        let bitmap = self.slot_bitmap(&ph);
        if id.slot as u32 >= bitmap.bits() || !bitmap.get(id.slot as u32) {
            self.pool.unpin_page(&ph)?;
            return Err(DbError::InvalidSlot(id.slot, id.page));
        }
        page::write_slot(
            self.pool.data_mut(&ph),
            self.num_slots_per_page,
            self.record_size,
            id.slot,
            &record.data,
        );
        self.pool.mark_dirty(&ph)?;
        self.pool.unpin_page(&ph)?;
        Ok(())
    }

    /// Clears the occupied slot named by `id`. If the page was full
    /// before the delete, it is pushed onto the free-list head (spec
    /// §4.3's deleteRecord algorithm); a page already somewhere in the
    /// list is left where it is.
    pub fn delete_record(&mut self, id: Rid) -> DbResult<()> {
        let ph = self.pool.pin_page(id.page)?;
        let mut bitmap = self.slot_bitmap(&ph);
        if id.slot as u32 >= bitmap.bits() || !bitmap.get(id.slot as u32) {
            self.pool.unpin_page(&ph)?;
            return Err(DbError::InvalidSlot(id.slot, id.page));
        }
        let was_full = bitmap.is_full();
        bitmap.clear(id.slot as u32);
        self.write_slot_bitmap(&ph, &bitmap);
        page::zero_slot(self.pool.data_mut(&ph), self.num_slots_per_page, self.record_size, id.slot);
        self.pool.mark_dirty(&ph)?;

        let header = self.pool.pin_page(0)?;
        if was_full {
            self.push_free_head(&header, &ph)?;
        }
        let num_tuples = header_num_tuples(self.pool.data(&header)).saturating_sub(1);
        header_set_num_tuples(self.pool.data_mut(&header), num_tuples);
        self.pool.mark_dirty(&header)?;
        self.pool.unpin_page(&header)?;

        self.pool.unpin_page(&ph)?;
        debug!(page = id.page, slot = id.slot, "deleted record");
        Ok(())
    }
}

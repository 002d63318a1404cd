//! Data-page layout: free-list links, occupancy bitmap, and the fixed-size
//! slot array (spec §3).
//!
//! ```text
//! prevFreePage (u32) | nextFreePage (u32) | bitmap | slots[numSlotsPerPage]
//! ```
//!
//! Exposed as free functions over a raw page buffer (rather than an
//! owning wrapper type) so the record manager can interleave reads and
//! writes against a buffer-pool-owned frame without fighting the
//! borrow checker over a long-lived view.

use crate::common::{PageNum, PAGE_SIZE};
use crate::record::bitmap::{encoded_len as bitmap_encoded_len, Bitmap};

const LINKS_LEN: usize = 8; // prevFreePage + nextFreePage

/// Largest `n` such that `PAGE_SIZE >= 2*u32 + bitmapBytes + n*record_size`,
/// where `bitmapBytes = 4*ceil(n/32) + 8` (spec §3's data-page invariant,
/// which is the byte-exact source of truth — it reconciles with §4.3's
/// shorthand `PAGE_SIZE >= 8 + ceil(n/32)*4 + n*recordSize` by folding the
/// page-link bytes and the bitmap's own (bits, words) header together).
pub fn num_slots_per_page(record_size: u16) -> u16 {
    let rs = record_size.max(1) as usize;
    let mut n: u32 = 0;
    loop {
        let next = n + 1;
        let total = LINKS_LEN + bitmap_encoded_len(next) + next as usize * rs;
        if total > PAGE_SIZE {
            break;
        }
        n = next;
    }
    n as u16
}

fn bitmap_len(num_slots: u16) -> usize {
    bitmap_encoded_len(num_slots as u32)
}

fn slots_offset(num_slots: u16) -> usize {
    LINKS_LEN + bitmap_len(num_slots)
}

pub fn slot_offset(num_slots: u16, record_size: u16, slot: u16) -> usize {
    slots_offset(num_slots) + slot as usize * record_size as usize
}

pub fn prev_free_page(buf: &[u8; PAGE_SIZE]) -> PageNum {
    u32::from_le_bytes(buf[0..4].try_into().unwrap())
}

pub fn set_prev_free_page(buf: &mut [u8; PAGE_SIZE], page_num: PageNum) {
    buf[0..4].copy_from_slice(&page_num.to_le_bytes());
}

pub fn next_free_page(buf: &[u8; PAGE_SIZE]) -> PageNum {
    u32::from_le_bytes(buf[4..8].try_into().unwrap())
}

pub fn set_next_free_page(buf: &mut [u8; PAGE_SIZE], page_num: PageNum) {
    buf[4..8].copy_from_slice(&page_num.to_le_bytes());
}

pub fn read_bitmap(buf: &[u8; PAGE_SIZE], num_slots: u16) -> Bitmap {
    let len = bitmap_len(num_slots);
    Bitmap::decode(&buf[LINKS_LEN..LINKS_LEN + len])
}

pub fn write_bitmap(buf: &mut [u8; PAGE_SIZE], num_slots: u16, bitmap: &Bitmap) {
    let len = bitmap_len(num_slots);
    bitmap.encode(&mut buf[LINKS_LEN..LINKS_LEN + len]);
}

pub fn read_slot<'a>(buf: &'a [u8; PAGE_SIZE], num_slots: u16, record_size: u16, slot: u16) -> &'a [u8] {
    let start = slot_offset(num_slots, record_size, slot);
    &buf[start..start + record_size as usize]
}

pub fn write_slot(buf: &mut [u8; PAGE_SIZE], num_slots: u16, record_size: u16, slot: u16, data: &[u8]) {
    let start = slot_offset(num_slots, record_size, slot);
    let len = record_size as usize;
    buf[start..start + len].copy_from_slice(&data[..len]);
}

pub fn zero_slot(buf: &mut [u8; PAGE_SIZE], num_slots: u16, record_size: u16, slot: u16) {
    let start = slot_offset(num_slots, record_size, slot);
    let len = record_size as usize;
    buf[start..start + len].fill(0);
}

/// Initializes a freshly allocated page: no free-list links, an empty
/// (all-clear) bitmap, zeroed slots.
pub fn init_empty_page(buf: &mut [u8; PAGE_SIZE], num_slots: u16) {
    set_prev_free_page(buf, 0);
    set_next_free_page(buf, 0);
    write_bitmap(buf, num_slots, &Bitmap::empty(num_slots as u32));
}

//! End-to-end buffer-manager scenarios (spec §8, scenarios 3-4).

use recordkernel::buffer::{BufferPool, Strategy};
use recordkernel::storage::{create_page_file, PageFile};
use tempdir::TempDir;

fn temp_pool(num_frames: usize, strategy: Strategy) -> (TempDir, BufferPool) {
    temp_pool_with_pages(num_frames, strategy, 1)
}

/// Like `temp_pool`, but pre-sizes the backing file to `min_pages` pages
/// first, so pins of page numbers below that bound are real disk reads
/// (`readIO` increments) rather than zero-fills of a page past EOF.
fn temp_pool_with_pages(num_frames: usize, strategy: Strategy, min_pages: u64) -> (TempDir, BufferPool) {
    let dir = TempDir::new("buffer_scenarios").unwrap();
    let path = dir.path().join("t.bin");
    let path = path.to_str().unwrap().to_string();
    create_page_file(&path).unwrap();
    if min_pages > 1 {
        let mut pf = PageFile::open(&path).unwrap();
        pf.ensure_capacity(min_pages).unwrap();
        pf.close().unwrap();
    }
    let pool = BufferPool::init(&path, num_frames, strategy).unwrap();
    (dir, pool)
}

#[test]
fn fifo_eviction_order_after_four_pins_into_three_frames() {
    let (_dir, mut pool) = temp_pool_with_pages(3, Strategy::Fifo, 5);
    for page in 1..=4u32 {
        let h = pool.pin_page(page).unwrap();
        pool.unpin_page(&h).unwrap();
    }

    let resident: Vec<u32> = pool.get_frame_contents().into_iter().flatten().collect();
    assert_eq!(resident.len(), 3);
    assert!(!resident.contains(&1), "page 1 should have been evicted first");
    for page in [2u32, 3, 4] {
        assert!(resident.contains(&page));
    }
    assert_eq!(pool.get_num_read_io(), 4);
    assert_eq!(pool.get_num_write_io(), 0);
}

#[test]
fn dirty_writeback_on_eviction_then_force_flush() {
    let (_dir, mut pool) = temp_pool(2, Strategy::Fifo);

    let h1 = pool.pin_page(1).unwrap();
    pool.mark_dirty(&h1).unwrap();
    pool.unpin_page(&h1).unwrap();

    let h2 = pool.pin_page(2).unwrap();
    pool.mark_dirty(&h2).unwrap();
    pool.unpin_page(&h2).unwrap();

    // forces eviction of whichever frame holds page 1.
    let h3 = pool.pin_page(3).unwrap();
    assert_eq!(pool.get_num_write_io(), 1);
    pool.unpin_page(&h3).unwrap();

    pool.force_flush_pool().unwrap();
    assert_eq!(pool.get_num_write_io(), 2);
}

#[test]
fn repinning_a_resident_page_does_not_touch_disk() {
    let (_dir, mut pool) = temp_pool(3, Strategy::Lru);
    let h = pool.pin_page(0).unwrap();
    pool.unpin_page(&h).unwrap();
    assert_eq!(pool.get_num_read_io(), 1);

    let h2 = pool.pin_page(0).unwrap();
    assert_eq!(pool.get_num_read_io(), 1);
    assert_eq!(pool.get_fix_counts().iter().filter(|&&c| c == 1).count(), 1);
    pool.unpin_page(&h2).unwrap();
}

#[test]
fn pinned_frames_are_never_chosen_as_victims() {
    let (_dir, mut pool) = temp_pool(2, Strategy::Clock);
    let _h1 = pool.pin_page(1).unwrap();
    let _h2 = pool.pin_page(2).unwrap();
    // both frames are pinned; a third pin has nowhere to go.
    assert!(pool.pin_page(3).is_err());
}

#[test]
fn shutdown_requires_zero_fix_counts() {
    let (_dir, mut pool) = temp_pool(2, Strategy::Lfu);
    let _h = pool.pin_page(1).unwrap();
    assert!(pool.shutdown().is_err());
}

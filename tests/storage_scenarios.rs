//! End-to-end storage-manager scenarios (spec §8, scenarios 1-2).

use rand::distributions::{Distribution, Uniform};
use recordkernel::common::{zeroed_page, PAGE_SIZE};
use recordkernel::error::DbError;
use recordkernel::storage::{create_page_file, destroy_page_file, PageFile};
use tempdir::TempDir;

fn temp_path(name: &str) -> (TempDir, String) {
    let dir = TempDir::new("storage_scenarios").unwrap();
    let path = dir.path().join(name);
    (dir, path.to_str().unwrap().to_string())
}

#[test]
fn storage_round_trip() {
    let (_dir, path) = temp_path("t.bin");
    create_page_file(&path).unwrap();
    let mut pf = PageFile::open(&path).unwrap();
    assert_eq!(pf.total_num_pages(), 1);
    assert_eq!(pf.get_block_pos(), None);

    let mut b = zeroed_page();
    for (i, byte) in b.iter_mut().enumerate() {
        *byte = b'0' + (i % 10) as u8;
    }
    pf.write_block(0, &b).unwrap();

    let mut out = zeroed_page();
    pf.read_first_block(&mut out).unwrap();
    assert_eq!(*out, *b);

    destroy_page_file(&path).unwrap();
}

#[test]
fn ensure_capacity_zero_fills_new_pages() {
    let (_dir, path) = temp_path("t.bin");
    create_page_file(&path).unwrap();
    let mut pf = PageFile::open(&path).unwrap();

    pf.ensure_capacity(4).unwrap();
    assert_eq!(pf.total_num_pages(), 4);

    let mut buf = [1u8; PAGE_SIZE];
    pf.read_block(3, &mut buf).unwrap();
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn reading_past_end_of_file_fails() {
    let (_dir, path) = temp_path("t.bin");
    create_page_file(&path).unwrap();
    let mut pf = PageFile::open(&path).unwrap();
    let mut buf = zeroed_page();
    assert_eq!(pf.read_block(5, &mut buf), Err(DbError::ReadNonExistingPage(5)));
}

#[test]
fn random_page_contents_survive_a_write_read_cycle() {
    let (_dir, path) = temp_path("t.bin");
    create_page_file(&path).unwrap();
    let mut pf = PageFile::open(&path).unwrap();

    let mut rng = rand::thread_rng();
    let byte_dist = Uniform::from(u8::MIN..=u8::MAX);
    let mut b = zeroed_page();
    for byte in b.iter_mut() {
        *byte = byte_dist.sample(&mut rng);
    }
    pf.write_block(0, &b).unwrap();

    let mut out = zeroed_page();
    pf.read_block(0, &mut out).unwrap();
    assert_eq!(*out, *b);
}

#[test]
fn positional_reads_walk_the_file() {
    let (_dir, path) = temp_path("t.bin");
    create_page_file(&path).unwrap();
    let mut pf = PageFile::open(&path).unwrap();
    pf.ensure_capacity(3).unwrap();

    let mut a = zeroed_page();
    a.fill(1);
    pf.write_block(1, &a).unwrap();
    let mut b = zeroed_page();
    b.fill(2);
    pf.write_block(2, &b).unwrap();

    let mut out = zeroed_page();
    pf.read_first_block(&mut out).unwrap();
    assert!(out.iter().all(|&b| b == 0));
    pf.read_next_block(&mut out).unwrap();
    assert!(out.iter().all(|&b| b == 1));
    pf.read_next_block(&mut out).unwrap();
    assert!(out.iter().all(|&b| b == 2));
    pf.read_previous_block(&mut out).unwrap();
    assert!(out.iter().all(|&b| b == 1));
    pf.read_last_block(&mut out).unwrap();
    assert!(out.iter().all(|&b| b == 2));
}

//! Storage Manager: treats a file as a sequence of fixed-size pages and
//! provides absolute/relative block I/O (spec §4.1).
//!
//! Every write is durably committed (an explicit flush) before the call
//! returns; all operations are synchronous and blocking, matching the
//! single-threaded cooperative model of the whole kernel (spec §5).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::common::{zeroed_page, PageNum, PAGE_SIZE};
use crate::error::{DbError, DbResult};

/// Creates a new page file containing exactly one page of zero bytes.
pub fn create_page_file(name: &str) -> DbResult<()> {
    if name.is_empty() {
        return Err(DbError::NoFilename);
    }
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(name)
        .map_err(|_| DbError::FileCreationFailed)?;
    file.write_all(zeroed_page().as_slice())
        .map_err(|_| DbError::FileCreationFailed)?;
    file.flush().map_err(|_| DbError::FileCreationFailed)?;
    Ok(())
}

/// Removes a page file from disk.
pub fn destroy_page_file(name: &str) -> DbResult<()> {
    std::fs::remove_file(name).map_err(|_| DbError::FileNotFound(name.to_string()))
}

/// A page file opened for read-write block I/O.
pub struct PageFile {
    file: File,
    file_name: String,
    total_num_pages: u64,
    /// The cursor used by the positional read/write operations. `None`
    /// until the first positional operation succeeds.
    cur_page_pos: Option<u64>,
}

impl PageFile {
    /// Opens an existing page file, computing `total_num_pages` from the
    /// file's current length.
    pub fn open(name: &str) -> DbResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(name)
            .map_err(|_| DbError::FileNotFound(name.to_string()))?;
        let len = file.metadata().map_err(DbError::from)?.len();
        let total_num_pages = len.div_ceil(PAGE_SIZE as u64);
        Ok(Self {
            file,
            file_name: name.to_string(),
            total_num_pages,
            cur_page_pos: None,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn total_num_pages(&self) -> u64 {
        self.total_num_pages
    }

    pub fn get_block_pos(&self) -> Option<u64> {
        self.cur_page_pos
    }

    /// Closes the page file. Provided so callers have an explicit
    /// close point matching spec §6's API surface; the underlying file
    /// handle is released regardless when `self` is dropped.
    pub fn close(self) -> DbResult<()> {
        Ok(())
    }

    fn check_page_num(&self, page_num: i64) -> DbResult<u64> {
        if page_num < 0 || page_num as u64 >= self.total_num_pages {
            return Err(DbError::ReadNonExistingPage(page_num.max(0) as PageNum));
        }
        Ok(page_num as u64)
    }

    /// Reads page `page_num` into `buf`. Fails with `ReadNonExistingPage`
    /// if the page is out of range.
    pub fn read_block(&mut self, page_num: PageNum, buf: &mut [u8; PAGE_SIZE]) -> DbResult<()> {
        let n = self.check_page_num(page_num as i64)?;
        self.file
            .seek(SeekFrom::Start(n * PAGE_SIZE as u64))
            .map_err(|_| DbError::OffsetFailed)?;
        self.file.read_exact(buf).map_err(|_| DbError::ReadFileFailed)?;
        Ok(())
    }

    /// Writes `buf` at page `page_num`, auto-extending the file with zero
    /// pages first if `page_num >= total_num_pages`.
    pub fn write_block(&mut self, page_num: PageNum, buf: &[u8; PAGE_SIZE]) -> DbResult<()> {
        if (page_num as i64) < 0 {
            return Err(DbError::OffsetFailed);
        }
        if page_num as u64 >= self.total_num_pages {
            self.ensure_capacity(page_num as u64 + 1)?;
        }
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .map_err(|_| DbError::OffsetFailed)?;
        self.file.write_all(buf).map_err(|_| DbError::WriteFailed)?;
        self.file.flush().map_err(|_| DbError::WriteFailed)?;
        self.cur_page_pos = Some(page_num as u64);
        Ok(())
    }

    /// Appends one zero page at the end of the file.
    pub fn append_empty_block(&mut self) -> DbResult<()> {
        let saved_pos = self.cur_page_pos;
        let new_page_num = self.total_num_pages;
        self.file
            .seek(SeekFrom::Start(new_page_num * PAGE_SIZE as u64))
            .map_err(|_| DbError::OffsetFailed)?;
        self.file
            .write_all(zeroed_page().as_slice())
            .map_err(|_| DbError::WriteFailed)?;
        self.file.flush().map_err(|_| DbError::WriteFailed)?;
        self.total_num_pages += 1;
        self.cur_page_pos = saved_pos;
        debug!(page = new_page_num, "appended empty block");
        Ok(())
    }

    /// Appends zero pages until `total_num_pages >= m`.
    pub fn ensure_capacity(&mut self, m: u64) -> DbResult<()> {
        while self.total_num_pages < m {
            self.append_empty_block()?;
        }
        Ok(())
    }

    pub fn read_first_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> DbResult<()> {
        self.read_block(0, buf)?;
        self.cur_page_pos = Some(0);
        Ok(())
    }

    pub fn read_last_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> DbResult<()> {
        if self.total_num_pages == 0 {
            return Err(DbError::ReadNonExistingPage(0));
        }
        let last = self.total_num_pages - 1;
        self.read_block(last as PageNum, buf)?;
        self.cur_page_pos = Some(last);
        Ok(())
    }

    pub fn read_current_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> DbResult<()> {
        let pos = self.cur_page_pos.ok_or(DbError::OffsetFailed)?;
        self.read_block(pos as PageNum, buf)?;
        self.cur_page_pos = Some(pos);
        Ok(())
    }

    pub fn read_next_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> DbResult<()> {
        let pos = self.cur_page_pos.ok_or(DbError::OffsetFailed)?;
        let next = pos + 1;
        self.read_block(next as PageNum, buf)?;
        self.cur_page_pos = Some(next);
        Ok(())
    }

    pub fn read_previous_block(&mut self, buf: &mut [u8; PAGE_SIZE]) -> DbResult<()> {
        let pos = self.cur_page_pos.ok_or(DbError::OffsetFailed)?;
        if pos == 0 {
            return Err(DbError::ReadNonExistingPage(0));
        }
        let prev = pos - 1;
        self.read_block(prev as PageNum, buf)?;
        self.cur_page_pos = Some(prev);
        Ok(())
    }

    /// Writes `buf` at the current block position.
    pub fn write_current_block(&mut self, buf: &[u8; PAGE_SIZE]) -> DbResult<()> {
        let pos = self.cur_page_pos.ok_or(DbError::OffsetFailed)?;
        self.write_block(pos as PageNum, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn temp_path(name: &str) -> (TempDir, String) {
        let dir = TempDir::new("page_file").unwrap();
        let path = dir.path().join(name);
        (dir, path.to_str().unwrap().to_string())
    }

    #[test]
    fn create_then_open_has_one_page() {
        let (_dir, path) = temp_path("t.bin");
        create_page_file(&path).unwrap();
        let pf = PageFile::open(&path).unwrap();
        assert_eq!(pf.total_num_pages(), 1);
        assert_eq!(pf.get_block_pos(), None);
    }

    #[test]
    fn storage_round_trip() {
        let (_dir, path) = temp_path("t.bin");
        create_page_file(&path).unwrap();
        let mut pf = PageFile::open(&path).unwrap();

        let mut b = zeroed_page();
        for i in 0..PAGE_SIZE {
            b[i] = b'0' + (i % 10) as u8;
        }
        pf.write_block(0, &b).unwrap();

        let mut out = zeroed_page();
        pf.read_first_block(&mut out).unwrap();
        assert_eq!(*out, *b);
        assert_eq!(pf.get_block_pos(), Some(0));
    }

    #[test]
    fn ensure_capacity_zero_fills() {
        let (_dir, path) = temp_path("t.bin");
        create_page_file(&path).unwrap();
        let mut pf = PageFile::open(&path).unwrap();
        pf.ensure_capacity(4).unwrap();
        assert_eq!(pf.total_num_pages(), 4);

        let mut buf = zeroed_page();
        pf.read_block(3, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn write_block_past_end_extends_file() {
        let (_dir, path) = temp_path("t.bin");
        create_page_file(&path).unwrap();
        let mut pf = PageFile::open(&path).unwrap();
        let data = zeroed_page();
        pf.write_block(5, &data).unwrap();
        assert_eq!(pf.total_num_pages(), 6);
    }

    #[test]
    fn read_non_existing_page_fails() {
        let (_dir, path) = temp_path("t.bin");
        create_page_file(&path).unwrap();
        let mut pf = PageFile::open(&path).unwrap();
        let mut buf = zeroed_page();
        assert_eq!(
            pf.read_block(7, &mut buf),
            Err(DbError::ReadNonExistingPage(7))
        );
    }

    #[test]
    fn negative_offset_fails() {
        let (_dir, path) = temp_path("t.bin");
        create_page_file(&path).unwrap();
        let mut pf = PageFile::open(&path).unwrap();
        assert_eq!(pf.check_page_num(-1), Err(DbError::ReadNonExistingPage(0)));
    }

    #[test]
    fn open_missing_file_fails() {
        let (_dir, path) = temp_path("missing.bin");
        assert!(matches!(PageFile::open(&path), Err(DbError::FileNotFound(_))));
    }

    #[test]
    fn create_empty_name_fails() {
        assert_eq!(create_page_file(""), Err(DbError::NoFilename));
    }

    #[test]
    fn destroy_removes_file() {
        let (_dir, path) = temp_path("t.bin");
        create_page_file(&path).unwrap();
        destroy_page_file(&path).unwrap();
        assert!(!Path::new(&path).exists());
    }
}

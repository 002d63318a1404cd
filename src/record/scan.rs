//! Filtered table scans (spec §4.3): a cursor over `(pageNum, slotNum)`
//! that walks in lexicographic order, skipping unoccupied slots and
//! records the predicate rejects.

use crate::common::{PageNum, SlotNum};
use crate::error::{DbError, DbResult};
use crate::predicate::Predicate;
use crate::record::page;
use crate::record::rid::{Record, Rid};
use crate::record::table::Table;

/// An open scan over one table. Borrows the table for its lifetime, the
/// same way a pin borrows a frame: only one scan (or other mutator) may
/// drive the table's buffer pool at a time.
pub struct Scan<'a> {
    table: &'a mut Table,
    predicate: Option<Box<dyn Predicate>>,
    page_num: PageNum,
    slot_num: SlotNum,
}

impl<'a> Scan<'a> {
    /// Starts a scan positioned at `(pageNum=1, slotNum=0)`, the first
    /// data page. An absent predicate matches every live record (spec
    /// §9's Open Question).
    pub fn start(table: &'a mut Table, predicate: Option<Box<dyn Predicate>>) -> Self {
        Self {
            table,
            predicate,
            page_num: 1,
            slot_num: 0,
        }
    }

    /// Advances the cursor to the next record the predicate accepts,
    /// returning it. `NoMoreTuples` once the cursor walks off the end of
    /// the table.
    pub fn next(&mut self) -> DbResult<Record> {
        loop {
            if self.page_num >= self.table.pool.next_page_id() {
                return Err(DbError::NoMoreTuples);
            }

            let num_slots = self.table.num_slots_per_page;
            let ph = self.table.pool.pin_page(self.page_num)?;
            let bitmap = page::read_bitmap(self.table.pool.data(&ph), num_slots);

            if self.slot_num as u32 >= bitmap.bits() {
                self.table.pool.unpin_page(&ph)?;
                self.page_num += 1;
                self.slot_num = 0;
                continue;
            }
            if !bitmap.get(self.slot_num as u32) {
                self.table.pool.unpin_page(&ph)?;
                self.slot_num += 1;
                continue;
            }

            let data = page::read_slot(
                self.table.pool.data(&ph),
                num_slots,
                self.table.record_size,
                self.slot_num,
            )
            .to_vec();
            self.table.pool.unpin_page(&ph)?;

            let record = Record {
                id: Rid::new(self.page_num, self.slot_num),
                data,
            };
            self.slot_num += 1;

            let matches = match &self.predicate {
                Some(p) => p.matches(&record, &self.table.schema),
                None => true,
            };
            if matches {
                return Ok(record);
            }
        }
    }

    /// Releases the scan's resources. A no-op beyond the borrow ending
    /// (spec §4.3: "closeScan is a no-op besides resource release"); no
    /// page stays pinned between `next` calls, so there is nothing to
    /// unpin here.
    pub fn close(self) -> DbResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::schema::{Attribute, DataType, Schema};
    use crate::record::rid::Record as Rec;
    use tempdir::TempDir;

    struct AtLeast(i32);

    impl Predicate for AtLeast {
        fn matches(&self, record: &Rec, schema: &Schema) -> bool {
            record.get_int(schema, 0).unwrap() >= self.0
        }
    }

    fn schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("id", DataType::Int),
                Attribute::new("name", DataType::FixedString(8)),
            ],
            vec![0],
        )
    }

    fn name_bytes(s: &str) -> Vec<u8> {
        let mut v = s.as_bytes().to_vec();
        v.resize(8, 0);
        v
    }

    #[test]
    fn scan_without_predicate_returns_all_live_records_in_order() {
        let dir = TempDir::new("scan").unwrap();
        let path = dir.path().join("t.bin");
        let path = path.to_str().unwrap().to_string();
        let schema = schema();
        Table::create(&path, &schema).unwrap();
        let mut table = Table::open(&path).unwrap();

        for (i, name) in [(1, "alice"), (2, "bob"), (3, "carl")] {
            let mut r = Record::new(table.record_size());
            r.set_int(&schema, 0, i).unwrap();
            r.set_attr(&schema, 1, &name_bytes(name)).unwrap();
            table.insert_record(&mut r).unwrap();
        }

        let mut scan = Scan::start(&mut table, None);
        let mut seen = Vec::new();
        loop {
            match scan.next() {
                Ok(r) => seen.push(r.get_int(&schema, 0).unwrap()),
                Err(DbError::NoMoreTuples) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        scan.close().unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
        table.close().unwrap();
    }

    #[test]
    fn scan_skips_deleted_slots_and_applies_predicate() {
        let dir = TempDir::new("scan").unwrap();
        let path = dir.path().join("t.bin");
        let path = path.to_str().unwrap().to_string();
        let schema = schema();
        Table::create(&path, &schema).unwrap();
        let mut table = Table::open(&path).unwrap();

        let mut r1 = Record::new(table.record_size());
        r1.set_int(&schema, 0, 1).unwrap();
        r1.set_attr(&schema, 1, &name_bytes("alice")).unwrap();
        table.insert_record(&mut r1).unwrap();

        let mut r2 = Record::new(table.record_size());
        r2.set_int(&schema, 0, 2).unwrap();
        r2.set_attr(&schema, 1, &name_bytes("bob")).unwrap();
        table.insert_record(&mut r2).unwrap();

        table.delete_record(r1.id).unwrap();

        let mut r3 = Record::new(table.record_size());
        r3.set_int(&schema, 0, 3).unwrap();
        r3.set_attr(&schema, 1, &name_bytes("carl")).unwrap();
        table.insert_record(&mut r3).unwrap();

        let mut scan = Scan::start(&mut table, Some(Box::new(AtLeast(2))));
        let mut names = Vec::new();
        loop {
            match scan.next() {
                Ok(r) => {
                    let bytes = r.get_attr(&schema, 1).unwrap();
                    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                    names.push(String::from_utf8(bytes[..end].to_vec()).unwrap());
                }
                Err(DbError::NoMoreTuples) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        scan.close().unwrap();
        // carl reused r1's deleted slot (1,0), ahead of bob at (1,1).
        assert_eq!(names, vec!["carl", "bob"]);
        table.close().unwrap();
    }
}

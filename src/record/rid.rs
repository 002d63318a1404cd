//! Record identifiers and the record value type (spec §3/§4.3).

use crate::common::{PageNum, SlotNum};
use crate::error::{DbError, DbResult};
use crate::record::schema::{DataType, Schema};

/// Record identifier: the pair (page number, slot number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rid {
    pub page: PageNum,
    pub slot: SlotNum,
}

impl Rid {
    pub fn new(page: PageNum, slot: SlotNum) -> Self {
        Self { page, slot }
    }
}

/// A record: its identifier plus a fixed-length byte buffer holding the
/// attribute values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: Rid,
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(record_size: u16) -> Self {
        Self {
            id: Rid::new(0, 0),
            data: vec![0u8; record_size as usize],
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            id: Rid::new(0, 0),
            data,
        }
    }

    /// Copies attribute `attr_num`'s bytes out of the record.
    pub fn get_attr(&self, schema: &Schema, attr_num: u16) -> DbResult<&[u8]> {
        let offset = schema.attr_offset(attr_num)?;
        let len = schema.attr_len(attr_num)? as usize;
        Ok(&self.data[offset..offset + len])
    }

    /// Copies `value` into attribute `attr_num`'s bytes. `value` must be
    /// exactly the attribute's fixed width.
    pub fn set_attr(&mut self, schema: &Schema, attr_num: u16, value: &[u8]) -> DbResult<()> {
        let offset = schema.attr_offset(attr_num)?;
        let len = schema.attr_len(attr_num)? as usize;
        if value.len() != len {
            return Err(DbError::InvalidAttribute(attr_num));
        }
        self.data[offset..offset + len].copy_from_slice(value);
        Ok(())
    }

    pub fn get_int(&self, schema: &Schema, attr_num: u16) -> DbResult<i32> {
        debug_assert!(matches!(
            schema.attributes[attr_num as usize].data_type,
            DataType::Int
        ));
        let bytes = self.get_attr(schema, attr_num)?;
        Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn set_int(&mut self, schema: &Schema, attr_num: u16, value: i32) -> DbResult<()> {
        self.set_attr(schema, attr_num, &value.to_le_bytes())
    }
}

//! Table schema: an ordered list of fixed-width attributes plus a subset
//! designated as key attributes (spec §3), and the byte-exact schema blob
//! that is embedded in the table header page.

use crate::error::{DbError, DbResult};

/// One of the four fixed-width attribute kinds named in spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    Bool,
    FixedString(u16),
}

impl DataType {
    pub fn byte_len(&self) -> u16 {
        match self {
            DataType::Int => 4,
            DataType::Float => 4,
            DataType::Bool => 1,
            DataType::FixedString(len) => *len,
        }
    }

    fn type_code(&self) -> u16 {
        match self {
            DataType::Int => 0,
            DataType::Float => 1,
            DataType::Bool => 2,
            DataType::FixedString(_) => 3,
        }
    }

    fn from_code(code: u16, len: u16) -> DbResult<Self> {
        match code {
            0 => Ok(DataType::Int),
            1 => Ok(DataType::Float),
            2 => Ok(DataType::Bool),
            3 => Ok(DataType::FixedString(len)),
            _ => Err(DbError::InitError(format!("unknown data type code {code}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
    /// Indexes into `attributes` of the key attributes.
    pub key_indexes: Vec<u16>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>, key_indexes: Vec<u16>) -> Self {
        Self {
            attributes,
            key_indexes,
        }
    }

    /// Sum of attribute byte lengths — the fixed size of one record.
    pub fn record_size(&self) -> u16 {
        self.attributes.iter().map(|a| a.data_type.byte_len()).sum()
    }

    pub fn num_attrs(&self) -> usize {
        self.attributes.len()
    }

    /// Byte offset of attribute `attr_num` within a record's data buffer.
    pub fn attr_offset(&self, attr_num: u16) -> DbResult<usize> {
        let idx = attr_num as usize;
        if idx >= self.attributes.len() {
            return Err(DbError::InvalidAttribute(attr_num));
        }
        Ok(self.attributes[..idx]
            .iter()
            .map(|a| a.data_type.byte_len() as usize)
            .sum())
    }

    pub fn attr_len(&self, attr_num: u16) -> DbResult<u16> {
        self.attributes
            .get(attr_num as usize)
            .map(|a| a.data_type.byte_len())
            .ok_or(DbError::InvalidAttribute(attr_num))
    }

    /// Encodes the schema blob embedded in the table header page (spec
    /// §3): `numAttr`; `numAttr` pairs of `(type, length)`; `keySize`;
    /// `keySize` key-attribute indexes; then `numAttr` attribute names,
    /// each prefixed by a `u16` length.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.attributes.len() as u16).to_le_bytes());
        for attr in &self.attributes {
            buf.extend_from_slice(&attr.data_type.type_code().to_le_bytes());
            buf.extend_from_slice(&attr.data_type.byte_len().to_le_bytes());
        }
        buf.extend_from_slice(&(self.key_indexes.len() as u16).to_le_bytes());
        for &k in &self.key_indexes {
            buf.extend_from_slice(&k.to_le_bytes());
        }
        for attr in &self.attributes {
            let name_bytes = attr.name.as_bytes();
            buf.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
            buf.extend_from_slice(name_bytes);
        }
        buf
    }

    /// Decodes a schema blob previously produced by [`Schema::encode`].
    /// Returns the schema and the number of bytes consumed.
    pub fn decode(buf: &[u8]) -> DbResult<(Self, usize)> {
        let mut pos = 0usize;
        let read_u16 = |buf: &[u8], pos: &mut usize| -> u16 {
            let v = u16::from_le_bytes(buf[*pos..*pos + 2].try_into().unwrap());
            *pos += 2;
            v
        };

        let num_attr = read_u16(buf, &mut pos);
        let mut type_lens = Vec::with_capacity(num_attr as usize);
        for _ in 0..num_attr {
            let code = read_u16(buf, &mut pos);
            let len = read_u16(buf, &mut pos);
            type_lens.push((code, len));
        }

        let key_size = read_u16(buf, &mut pos);
        let mut key_indexes = Vec::with_capacity(key_size as usize);
        for _ in 0..key_size {
            key_indexes.push(read_u16(buf, &mut pos));
        }

        let mut attributes = Vec::with_capacity(num_attr as usize);
        for &(code, len) in &type_lens {
            let name_len = read_u16(buf, &mut pos) as usize;
            let name = String::from_utf8(buf[pos..pos + name_len].to_vec())
                .map_err(|e| DbError::InitError(format!("invalid attribute name: {e}")))?;
            pos += name_len;
            attributes.push(Attribute::new(name, DataType::from_code(code, len)?));
        }

        Ok((Schema::new(attributes, key_indexes), pos))
    }
}

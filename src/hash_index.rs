//! Chaining hash index + `HASH_JSON` array-unwrap variant (spec.md §4.3).
//! New (no close teacher analogue); grounded on `dbindex.c`'s
//! `wg_search_hash`/`create_hash_index` unwrap-on-insert logic. The
//! "idxhash collaborator" that chains byte keys to record-offset lists
//! is `std::collections::HashMap<Vec<u8>, Vec<RecordId>>` here — each
//! bucket's `Vec` is the chain, the same multimap shape `record.rs`
//! already uses for `backlink_index`.

use std::collections::HashMap;

use crate::error::{Result, WgError};
use crate::ids::RecordId;
use crate::record::{Meta, RecordStore};
use crate::value::Value;

/// Separator byte between a record's indexed-column encodings (spec.md
/// §4.3, "concatenated with a single separator byte").
const FIELD_SEP: u8 = 0xff;

/// True if `rid` is itself a schema array/object record (spec.md §4.3:
/// such records are never hashed directly, only reached via their parent
/// plain record).
fn is_array_or_object(store: &RecordStore, rid: RecordId) -> Result<bool> {
    let record = store
        .get(rid)
        .ok_or_else(|| WgError::bad_argument(format!("no such record {rid}")))?;
    Ok(record.meta.intersects(Meta::ARRAY | Meta::OBJECT))
}

/// A chaining hash index over one or more columns.
#[derive(Debug)]
pub struct HashIndex {
    columns: Vec<usize>,
    json: bool,
    buckets: HashMap<Vec<u8>, Vec<RecordId>>,
    /// Caps total chained entries to exercise the documented failure
    /// model (spec.md §4.3: "memory-allocation failure during add
    /// leaves previously added hash strings in place"). `None` means
    /// unbounded.
    capacity: Option<usize>,
    len: usize,
}

impl HashIndex {
    pub fn new(columns: Vec<usize>, json: bool) -> HashIndex {
        HashIndex {
            columns,
            json,
            buckets: HashMap::new(),
            capacity: None,
            len: 0,
        }
    }

    #[cfg(test)]
    pub fn with_capacity(columns: Vec<usize>, json: bool, capacity: usize) -> HashIndex {
        let mut h = HashIndex::new(columns, json);
        h.capacity = Some(capacity);
        h
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Every key combination a record contributes, after `HASH_JSON`
    /// array-unwrap (spec.md §4.3 "JSON variant"). Non-JSON indexes
    /// always contribute exactly one key.
    fn keys_for_record(&self, store: &RecordStore, rid: RecordId) -> Result<Vec<Vec<u8>>> {
        let record = store
            .get(rid)
            .ok_or_else(|| WgError::bad_argument(format!("no such record {rid}")))?;

        let plain = !record.meta.intersects(Meta::ARRAY | Meta::OBJECT);
        let mut per_column: Vec<Vec<Value>> = Vec::with_capacity(self.columns.len());
        for &col in &self.columns {
            let value = record
                .get(col)
                .ok_or_else(|| WgError::bad_argument(format!("column {col} out of range")))?
                .clone();
            if self.json && plain {
                if let Some(array_rid) = value.as_record() {
                    if let Some(array_rec) = store.get(array_rid) {
                        if array_rec.meta.contains(Meta::ARRAY) {
                            per_column.push(array_rec.fields.clone());
                            continue;
                        }
                    }
                }
            }
            per_column.push(vec![value]);
        }

        let mut keys = vec![Vec::new()];
        for alternatives in per_column {
            let mut next = Vec::with_capacity(keys.len() * alternatives.len());
            for prefix in &keys {
                for v in &alternatives {
                    let mut key = prefix.clone();
                    if !prefix.is_empty() {
                        key.push(FIELD_SEP);
                    }
                    v.encode_for_hashing(&mut key);
                    next.push(key);
                }
            }
            keys = next;
        }
        Ok(keys)
    }

    /// Indexes `rid`. On simulated out-of-memory, keys already inserted
    /// for this record are left in place — per the documented failure
    /// model, the caller is expected to delete the record, which drives
    /// a symmetric [`HashIndex::remove`].
    ///
    /// Records that are themselves schema arrays/objects are never hashed
    /// directly (spec.md §4.3: "reached via their parent plain records
    /// only") — they're skipped here rather than contributing keys under
    /// their own element values.
    pub fn add(&mut self, store: &RecordStore, rid: RecordId) -> Result<()> {
        if is_array_or_object(store, rid)? {
            return Ok(());
        }
        let keys = self.keys_for_record(store, rid)?;
        for key in keys {
            if let Some(cap) = self.capacity {
                if self.len >= cap {
                    return Err(WgError::out_of_memory("hash index bucket capacity exceeded"));
                }
            }
            self.buckets.entry(key).or_default().push(rid);
            self.len += 1;
        }
        Ok(())
    }

    /// Drops every chain entry for `rid`, freeing buckets that empty out.
    pub fn remove(&mut self, store: &RecordStore, rid: RecordId) -> Result<()> {
        if is_array_or_object(store, rid)? {
            return Ok(());
        }
        let keys = self.keys_for_record(store, rid)?;
        for key in keys {
            if let Some(chain) = self.buckets.get_mut(&key) {
                let before = chain.len();
                chain.retain(|&r| r != rid);
                self.len -= before - chain.len();
                if chain.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
        Ok(())
    }

    /// Looks up the chain for an explicit value tuple (spec.md §4.3
    /// `search`). `values.len()` must match the index's column count.
    pub fn search(&self, values: &[Value]) -> Result<&[RecordId]> {
        if values.len() != self.columns.len() {
            return Err(WgError::bad_argument(format!(
                "search expected {} values, got {}",
                self.columns.len(),
                values.len()
            )));
        }
        let mut key = Vec::new();
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                key.push(FIELD_SEP);
            }
            v.encode_for_hashing(&mut key);
        }
        Ok(self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[]))
    }

    pub fn stats(&self) -> HashIndexStats {
        HashIndexStats {
            bucket_count: self.buckets.len(),
            entry_count: self.len,
            max_chain_len: self.buckets.values().map(Vec::len).max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashIndexStats {
    pub bucket_count: usize,
    pub entry_count: usize,
    pub max_chain_len: usize,
}

#[cfg(test)]
#[path = "hash_index_test.rs"]
mod hash_index_test;

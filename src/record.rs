//! Fixed-slot records with meta bits, spec.md §3 ("Record") and §6
//! ("Record meta bits"). Grounded on `core.rs`'s `Entry<K, V>` field
//! layout style, generalised from a single key/value pair to an
//! arbitrary-length field array the way `dbschema.c`'s triples/kv-pairs/
//! arrays/objects need.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::arena::Slab;
use crate::error::{Result, WgError};
use crate::ids::RecordId;
use crate::value::Value;

bitflags! {
    /// Independent meta bits, spec.md §6: `array=1, object=2, document=4,
    /// notdata=8, match=16`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Meta: u8 {
        const ARRAY    = 0b0000_0001;
        const OBJECT   = 0b0000_0010;
        const DOCUMENT = 0b0000_0100;
        const NOTDATA  = 0b0000_1000;
        const MATCH    = 0b0001_0000;
    }
}

impl Meta {
    /// spec.md §3 invariant: "`notdata|match` records are invisible to
    /// full scans and to `find_first`/`find_next`".
    pub fn is_hidden_from_scan(self) -> bool {
        self.intersects(Meta::NOTDATA | Meta::MATCH)
    }
}

/// A fixed-length array of encoded values plus its meta bits and backlink
/// list, spec.md §3.
#[derive(Debug, Clone)]
pub struct Record {
    pub fields: Vec<Value>,
    pub meta: Meta,
}

impl Record {
    pub fn new(fields: Vec<Value>, meta: Meta) -> Record {
        Record { fields, meta }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<&Value> {
        self.fields.get(column)
    }
}

/// Owns every live record. Handles (`RecordId`) are stable slab indices,
/// not raw pointers, so they survive `Vec` growth the way an offset
/// survives shared-memory relocation (spec.md §9 design note). Tombstones
/// (`None` slots) are reused via a free list, standing in for the
/// allocator collaborator's `free_fixed`/`alloc_fixed` (spec.md §6).
#[derive(Debug, Default)]
pub struct RecordStore {
    slots: Slab<Record>,
    /// Reverse index: a record that appears as a `Value::Record` field of
    /// another record gets a backlink entry here, maintained by
    /// `set_field`/`insert` so deletion (spec.md §4.6 `delete_document`)
    /// can walk backlinks without a full scan.
    backlink_index: HashMap<RecordId, Vec<RecordId>>,
}

impl RecordStore {
    pub fn new() -> Self {
        RecordStore::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.slots.get(id.0)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.slots.get_mut(id.0)
    }

    /// Allocates a record, registering forward references as backlinks.
    /// Mirrors the allocator's `alloc_fixed` (spec.md §6): returns a
    /// stable handle, never a raw pointer.
    pub fn insert(&mut self, record: Record) -> RecordId {
        let id = RecordId(self.slots.insert(record));
        self.reindex_backlinks_for(id);
        id
    }

    fn reindex_backlinks_for(&mut self, id: RecordId) {
        let refs: Vec<RecordId> = self
            .get(id)
            .map(|r| r.fields.iter().filter_map(Value::as_record).collect())
            .unwrap_or_default();
        for target in refs {
            self.backlink_index.entry(target).or_default().push(id);
        }
    }

    /// Field-set API: the only path through which a field's value may
    /// change, so that callers (the index registry, spec.md §4.4) can
    /// call `del_field`/`add_field` before/after the change as the
    /// concurrency model (spec.md §5) requires.
    pub fn set_field(&mut self, id: RecordId, column: usize, value: Value) -> Result<Value> {
        let old_ref = self.get(id).and_then(|r| r.get(column)).and_then(Value::as_record);
        let new_ref = value.as_record();
        let old = {
            let record = self
                .get_mut(id)
                .ok_or_else(|| WgError::bad_argument(format!("no such record {id}")))?;
            if column >= record.fields.len() {
                return Err(WgError::bad_argument(format!(
                    "column {column} out of range for record of length {}",
                    record.fields.len()
                )));
            }
            std::mem::replace(&mut record.fields[column], value)
        };
        if let Some(t) = old_ref {
            if let Some(v) = self.backlink_index.get_mut(&t) {
                v.retain(|&r| r != id);
            }
        }
        if let Some(t) = new_ref {
            self.backlink_index.entry(t).or_default().push(id);
        }
        Ok(old)
    }

    /// Removes a record. Does not cascade — callers that need recursive
    /// document delete use `schema::delete_document`.
    pub fn remove(&mut self, id: RecordId) -> Option<Record> {
        let record = self.slots.remove(id.0)?;
        for target in record.fields.iter().filter_map(Value::as_record) {
            if let Some(v) = self.backlink_index.get_mut(&target) {
                v.retain(|&r| r != id);
            }
        }
        self.backlink_index.remove(&id);
        Some(record)
    }

    /// Records referencing `id` through a `Value::Record` field.
    pub fn backlinks_of(&self, id: RecordId) -> &[RecordId] {
        self.backlink_index
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates all live records, skipping `notdata|match` ones (spec.md
    /// §3 invariant), used by the query engine's full scan.
    pub fn iter_visible(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.slots
            .iter()
            .filter(|(_, r)| !r.meta.is_hidden_from_scan())
            .map(|(i, r)| (RecordId(i), r))
    }

    /// Iterates every live record including `notdata|match` ones.
    pub fn iter_all(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.slots.iter().map(|(i, r)| (RecordId(i), r))
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

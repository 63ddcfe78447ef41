//! Triple/kv-pair/array/object construction and recursive document
//! deletion (spec.md §4.6). Grounded on `dbschema.c`'s record-shape
//! constructors and its backlink-walking `find_document`/
//! `delete_document`; indexing and backlink bookkeeping reuse
//! `index_registry.rs`/`record.rs` rather than a separate offset walk.

use std::cmp::Ordering;

use crate::compare::compare;
use crate::error::{Result, WgError};
use crate::ids::RecordId;
use crate::index_registry::{IndexKind, IndexRegistry};
use crate::record::{Meta, Record, RecordStore};
use crate::value::Value;

fn create_record(store: &mut RecordStore, registry: &mut IndexRegistry, fields: Vec<Value>, mut meta: Meta, isparam: bool) -> Result<RecordId> {
    if isparam {
        meta |= Meta::NOTDATA | Meta::MATCH;
    }
    let rid = store.insert(Record::new(fields, meta));
    if !isparam {
        registry.add_rec(store, rid)?;
    }
    Ok(rid)
}

/// `create_triple(s, p, o, isparam)` (spec.md §4.6): a three-slot record.
pub fn create_triple(store: &mut RecordStore, registry: &mut IndexRegistry, s: Value, p: Value, o: Value, isparam: bool) -> Result<RecordId> {
    create_record(store, registry, vec![s, p, o], Meta::empty(), isparam)
}

/// `create_kvpair(k, v, isparam)` (spec.md §4.6, glossary "kv-pairs have a
/// null first slot"): a three-slot record shaped `(null, key, value)`.
pub fn create_kvpair(store: &mut RecordStore, registry: &mut IndexRegistry, k: Value, v: Value, isparam: bool) -> Result<RecordId> {
    create_record(store, registry, vec![Value::Null, k, v], Meta::empty(), isparam)
}

/// `create_array(n, isdocument, isparam)` (spec.md §4.6): an n-slot record
/// with the `array` meta bit set, plus `document` when it roots one.
pub fn create_array(store: &mut RecordStore, registry: &mut IndexRegistry, fields: Vec<Value>, isdocument: bool, isparam: bool) -> Result<RecordId> {
    let mut meta = Meta::ARRAY;
    if isdocument {
        meta |= Meta::DOCUMENT;
    }
    create_record(store, registry, fields, meta, isparam)
}

/// `create_object(n, isdocument, isparam)` (spec.md §4.6): same shape as
/// [`create_array`] with the `object` meta bit instead of `array`, plus a
/// duplicate-key guard over the kv-pair fields being wired in (SPEC_FULL
/// §11 "schema layer's uniqueness checks").
pub fn create_object(store: &mut RecordStore, registry: &mut IndexRegistry, fields: Vec<Value>, isdocument: bool, isparam: bool) -> Result<RecordId> {
    reject_duplicate_keys(store, registry, &fields)?;
    let mut meta = Meta::OBJECT;
    if isdocument {
        meta |= Meta::DOCUMENT;
    }
    create_record(store, registry, fields, meta, isparam)
}

/// Rejects `fields` if two of its kv-pair children (a `Value::Record`
/// whose target has a `null` slot 0, per the kv-pair shape) share the same
/// key slot. Walks a T-tree index over the key column (1) via
/// `find_first`/`find_next` when one is available, falling back to a
/// direct scan of `fields` otherwise.
fn reject_duplicate_keys(store: &RecordStore, registry: &IndexRegistry, fields: &[Value]) -> Result<()> {
    let children: Vec<RecordId> = fields
        .iter()
        .filter_map(|v| v.as_record())
        .filter(|&rid| matches!(store.get(rid).and_then(|r| r.get(0)), Some(Value::Null)))
        .collect();

    let indexed = registry
        .column_to_index(&[1], Some(IndexKind::TTree))
        .and_then(|id| registry.ttree(id));

    let mut seen: Vec<RecordId> = Vec::new();
    for &child in &children {
        let Some(key) = store.get(child).and_then(|r| r.get(1)) else {
            continue;
        };
        let duplicate = match indexed {
            Some(tree) => {
                let mut candidate = tree.find_first(store, key);
                let mut found = false;
                while let Some(rid) = candidate {
                    if rid != child && seen.contains(&rid) {
                        found = true;
                        break;
                    }
                    candidate = tree.find_next(store, key, rid);
                }
                found
            }
            None => seen
                .iter()
                .any(|&rid| store.get(rid).and_then(|r| r.get(1)).map(|k| compare(k, key, Some(store)) == Ordering::Equal).unwrap_or(false)),
        };
        if duplicate {
            return Err(WgError::constraint("duplicate key in object"));
        }
        seen.push(child);
    }
    Ok(())
}

/// `find_document(rec)` (spec.md §4.6): walks backlinks depth-first,
/// bounded by `max_depth`, to the nearest ancestor (or `rec` itself) whose
/// `document` meta bit is set.
pub fn find_document(store: &RecordStore, rec: RecordId, max_depth: usize) -> Option<RecordId> {
    if store.get(rec)?.meta.contains(Meta::DOCUMENT) {
        return Some(rec);
    }
    let mut frontier = vec![rec];
    for _ in 0..max_depth {
        let mut next = Vec::new();
        for r in frontier {
            for &parent in store.backlinks_of(r) {
                if store.get(parent).map(|p| p.meta.contains(Meta::DOCUMENT)).unwrap_or(false) {
                    return Some(parent);
                }
                next.push(parent);
            }
        }
        if next.is_empty() {
            return None;
        }
        frontier = next;
    }
    None
}

/// `delete_document(doc)` (spec.md §4.6): recursively clears every
/// record-valued field of `doc` (breaking backlinks before its children
/// are freed), deletes each child the same way, then deletes `doc`
/// itself. Returns the total number of records removed.
pub fn delete_document(store: &mut RecordStore, registry: &mut IndexRegistry, doc: RecordId) -> Result<usize> {
    let mut count = 0;
    delete_recursive(store, registry, doc, &mut count)?;
    Ok(count)
}

fn delete_recursive(store: &mut RecordStore, registry: &mut IndexRegistry, rid: RecordId, count: &mut usize) -> Result<()> {
    registry.del_rec(store, rid)?;

    let children: Vec<(usize, RecordId)> = store
        .get(rid)
        .map(|r| r.fields.iter().enumerate().filter_map(|(i, v)| v.as_record().map(|c| (i, c))).collect())
        .unwrap_or_default();

    for &(col, _) in &children {
        store.set_field(rid, col, Value::Null)?;
    }
    for (_, child) in children {
        delete_recursive(store, registry, child, count)?;
    }

    store.remove(rid);
    *count += 1;
    Ok(())
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod schema_test;

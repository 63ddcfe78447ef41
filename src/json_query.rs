//! JSON (document) query clause algorithm (spec.md §4.5.1). Grounded on
//! `dbjson.c`'s clause ordering/intersection; the dedup/intersect
//! crossovers come from `options.rs`'s `json_dedup_crossover`/
//! `json_intersect_crossover`, and the final result wraps `mempool.rs`.

use std::collections::HashSet;

use crate::compare::compare;
use crate::ids::RecordId;
use crate::mempool::ResultSet;
use crate::options::Options;
use crate::record::{Meta, Record, RecordStore};
use crate::schema::find_document;
use crate::value::Value;

/// One `{key, value}` clause (spec.md §4.5.1 "Input").
#[derive(Debug, Clone)]
pub struct Clause {
    pub key: Value,
    pub value: Value,
}

impl Clause {
    pub fn new(key: Value, value: Value) -> Clause {
        Clause { key, value }
    }

    fn is_literal(&self) -> bool {
        !matches!(self.value, Value::Record(_))
    }
}

/// A kv-pair record (glossary: three slots, `(null, key, value)`) matches
/// `clause` if its key slot equals `clause.key` and either its value slot
/// equals `clause.value` directly, or — the array-unwrap rule shared with
/// `hash_index.rs`'s `HASH_JSON` variant — the value slot is an array
/// record containing `clause.value` as one of its elements.
fn kvpair_matches(store: &RecordStore, record: &Record, clause: &Clause) -> bool {
    if record.len() != 3 {
        return false;
    }
    let Some(key) = record.get(1) else { return false };
    if compare(key, &clause.key, Some(store)) != std::cmp::Ordering::Equal {
        return false;
    }
    let Some(value) = record.get(2) else { return false };
    if compare(value, &clause.value, Some(store)) == std::cmp::Ordering::Equal {
        return true;
    }
    if let Some(array_rid) = value.as_record() {
        if let Some(array_rec) = store.get(array_rid) {
            if array_rec.meta.contains(Meta::ARRAY) {
                return array_rec.fields.iter().any(|v| compare(v, &clause.value, Some(store)) == std::cmp::Ordering::Equal);
            }
        }
    }
    false
}

fn dedup(items: Vec<RecordId>, crossover: usize) -> Vec<RecordId> {
    if items.len() >= crossover {
        let mut seen = HashSet::with_capacity(items.len());
        items.into_iter().filter(|r| seen.insert(*r)).collect()
    } else {
        let mut out: Vec<RecordId> = Vec::with_capacity(items.len());
        for r in items {
            if !out.contains(&r) {
                out.push(r);
            }
        }
        out
    }
}

fn intersect(running: Vec<RecordId>, fresh: &[RecordId], crossover: usize) -> Vec<RecordId> {
    if fresh.len() >= crossover {
        let set: HashSet<RecordId> = fresh.iter().copied().collect();
        running.into_iter().filter(|r| set.contains(r)).collect()
    } else {
        running.into_iter().filter(|r| fresh.contains(r)).collect()
    }
}

/// Every document root reachable from a kv-pair matching `clause` (spec.md
/// §4.5.1 step 2). No separate two-column hash probe or key-only T-tree
/// range scan distinguishes kv-pair records from any other three-slot
/// record in this crate, so those faster paths both degenerate to the
/// full scan here (DESIGN.md open question).
fn clause_roots(store: &RecordStore, clause: &Clause, options: &Options) -> Vec<RecordId> {
    let matches: Vec<RecordId> = store
        .iter_visible()
        .filter(|(_, r)| kvpair_matches(store, r, clause))
        .map(|(rid, _)| rid)
        .collect();

    let roots: Vec<RecordId> = matches
        .into_iter()
        .filter_map(|kv| find_document(store, kv, options.max_document_depth))
        .collect();

    dedup(roots, options.json_dedup_crossover)
}

/// Runs the full JSON query algorithm (spec.md §4.5.1 steps 1-5): orders
/// clauses literal-valued first, produces and dedups each clause's
/// document-root set, intersects it into the running set, and wraps the
/// final set as a prefetch materialisation.
pub fn run(store: &RecordStore, options: &Options, mut clauses: Vec<Clause>) -> ResultSet {
    clauses.sort_by_key(|c| !c.is_literal());

    let mut running: Option<Vec<RecordId>> = None;
    for clause in &clauses {
        let fresh = clause_roots(store, clause, options);
        running = Some(match running {
            None => fresh,
            Some(prev) => intersect(prev, &fresh, options.json_intersect_crossover),
        });
    }

    let mut results = ResultSet::new();
    for rid in running.unwrap_or_default() {
        results.push(rid);
    }
    results
}

#[cfg(test)]
#[path = "json_query_test.rs"]
mod json_query_test;

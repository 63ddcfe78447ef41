//! Per-column index chains, master list, and record-change dispatch
//! (spec.md §4.4). Grounded on `dbindex.c`'s `wg_create_index`/
//! `wg_index_add_rec` column-chain-splice-by-template-specificity
//! algorithm; storage reuses the `arena::Slab` pattern already used for
//! records and T-nodes instead of the original's offset table.

use std::collections::HashMap;

use crate::arena::Slab;
use crate::error::{Result, WgError};
use crate::hash_index::HashIndex;
use crate::ids::{IndexId, RecordId, TemplateId};
use crate::options::Options;
use crate::record::RecordStore;
use crate::template::{Template, TemplateStore};
use crate::ttree::TTreeIndex;
use crate::value::Value;

/// Index type codes (spec.md §6): `TTREE=50, TTREE_JSON=51, HASH=60,
/// HASH_JSON=61`. `TTreeJson` is accepted at `create` time but carries no
/// array-unwrap semantics of its own: spec.md §4.3's JSON variant is
/// defined only for the hash engine and never elaborated for T-trees, so
/// a `TTreeJson` request behaves exactly like `TTree` (DESIGN.md open
/// question).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    TTree,
    TTreeJson,
    Hash,
    HashJson,
}

enum Engine {
    TTree(TTreeIndex),
    Hash(HashIndex),
}

struct IndexEntry {
    columns: Vec<usize>,
    kind: IndexKind,
    template: Option<TemplateId>,
    engine: Engine,
}

impl IndexEntry {
    fn last_column(&self) -> usize {
        *self.columns.last().expect("index always covers >=1 column")
    }
}

/// Owns every live index, the per-column chains used for plan selection,
/// and the deduplicated template list (spec.md §4.4 "State").
pub struct IndexRegistry {
    indexes: Slab<IndexEntry>,
    by_column: HashMap<usize, Vec<IndexId>>,
    templates: TemplateStore,
    max_index_fields: usize,
    max_indexed_fieldnr: usize,
    ttree_node_size: usize,
    ttree_underflow_threshold: usize,
}

impl IndexRegistry {
    pub fn new(options: &Options) -> Self {
        IndexRegistry {
            indexes: Slab::new(),
            by_column: HashMap::new(),
            templates: TemplateStore::new(),
            max_index_fields: options.max_index_fields,
            max_indexed_fieldnr: options.max_indexed_fieldnr,
            ttree_node_size: options.ttree_node_size,
            ttree_underflow_threshold: options.ttree_underflow_threshold,
        }
    }

    fn validate_columns(&self, columns: &mut Vec<usize>) -> Result<()> {
        if columns.is_empty() {
            return Err(WgError::bad_argument("index must cover at least one column"));
        }
        columns.sort_unstable();
        let before = columns.len();
        columns.dedup();
        if columns.len() != before {
            return Err(WgError::bad_argument("duplicate columns in index request"));
        }
        if columns.len() > self.max_index_fields {
            return Err(WgError::bad_argument(format!(
                "index covers {} columns, limit is {}",
                columns.len(),
                self.max_index_fields
            )));
        }
        if *columns.last().unwrap() > self.max_indexed_fieldnr {
            return Err(WgError::bad_argument(format!(
                "column {} exceeds the configured maximum indexed column",
                columns.last().unwrap()
            )));
        }
        Ok(())
    }

    fn fixed_rank(&self, template: Option<TemplateId>) -> usize {
        template
            .and_then(|t| self.templates.get(t))
            .map(Template::fixed_count)
            .unwrap_or(0)
    }

    fn find_identical(&self, columns: &[usize], kind: IndexKind, template: Option<TemplateId>) -> Option<IndexId> {
        self.indexes
            .iter()
            .find(|(_, e)| e.columns == columns && e.kind == kind && e.template == template)
            .map(|(i, _)| IndexId(i))
    }

    /// Inserts `id` into column `col`'s chain, keeping it sorted by
    /// descending fixed-column count so plan selection can stop at the
    /// first usable match (spec.md §4.4 `create`).
    fn splice_into_chain(&mut self, col: usize, id: IndexId, rank: usize) {
        let existing_ranks: Vec<usize> = self
            .by_column
            .get(&col)
            .map(|chain| {
                chain
                    .iter()
                    .map(|&existing| self.fixed_rank(self.indexes.get(existing.0).and_then(|e| e.template)))
                    .collect()
            })
            .unwrap_or_default();
        let pos = existing_ranks.iter().position(|&r| r < rank).unwrap_or(existing_ranks.len());
        self.by_column.entry(col).or_default().insert(pos, id);
    }

    /// Creates a new index, backfilling it from every record already in
    /// `store` that matches `template` (spec.md §4.4 `create`).
    pub fn create(
        &mut self,
        store: &RecordStore,
        mut columns: Vec<usize>,
        kind: IndexKind,
        template_fields: Option<Vec<Value>>,
    ) -> Result<IndexId> {
        self.validate_columns(&mut columns)?;
        if matches!(kind, IndexKind::TTree | IndexKind::TTreeJson) && columns.len() != 1 {
            return Err(WgError::bad_argument("T-tree indexes are single-column"));
        }

        let template = template_fields.map(|f| self.templates.intern(f));

        if self.find_identical(&columns, kind, template).is_some() {
            if let Some(t) = template {
                self.templates.release(t);
            }
            return Err(WgError::constraint("identical index already exists"));
        }

        let engine = match kind {
            IndexKind::TTree | IndexKind::TTreeJson => {
                Engine::TTree(TTreeIndex::with_underflow_threshold(columns[0], self.ttree_node_size, self.ttree_underflow_threshold))
            }
            IndexKind::Hash => Engine::Hash(HashIndex::new(columns.clone(), false)),
            IndexKind::HashJson => Engine::Hash(HashIndex::new(columns.clone(), true)),
        };

        let rank = self.fixed_rank(template);
        let entry = IndexEntry {
            columns: columns.clone(),
            kind,
            template,
            engine,
        };
        let id = IndexId(self.indexes.insert(entry));

        for &col in &columns {
            self.splice_into_chain(col, id, rank);
        }

        let candidates: Vec<RecordId> = store.iter_visible().map(|(rid, _)| rid).collect();
        for rid in candidates {
            if self.record_matches(store, id, rid) {
                self.engine_add(id, store, rid)?;
            }
        }

        Ok(id)
    }

    /// Unlinks and frees an index (spec.md §4.4 `drop`).
    pub fn drop_index(&mut self, id: IndexId) -> Result<()> {
        let entry = self
            .indexes
            .remove(id.0)
            .ok_or_else(|| WgError::bad_argument(format!("no such index {id}")))?;
        for col in entry.columns {
            if let Some(chain) = self.by_column.get_mut(&col) {
                chain.retain(|&x| x != id);
            }
        }
        if let Some(t) = entry.template {
            self.templates.release(t);
        }
        Ok(())
    }

    fn record_matches(&self, store: &RecordStore, id: IndexId, rid: RecordId) -> bool {
        let Some(entry) = self.indexes.get(id.0) else {
            return false;
        };
        let Some(record) = store.get(rid) else {
            return false;
        };
        match entry.template {
            Some(t) => self.templates.get(t).map(|tpl| tpl.matches(record)).unwrap_or(false),
            None => true,
        }
    }

    fn engine_add(&mut self, id: IndexId, store: &RecordStore, rid: RecordId) -> Result<()> {
        match &mut self.indexes.get_mut(id.0).expect("id just validated").engine {
            Engine::TTree(t) => t.add(store, rid),
            Engine::Hash(h) => h.add(store, rid),
        }
    }

    fn engine_remove(&mut self, id: IndexId, store: &RecordStore, rid: RecordId) -> Result<()> {
        match &mut self.indexes.get_mut(id.0).expect("id just validated").engine {
            Engine::TTree(t) => t.remove(store, rid),
            Engine::Hash(h) => h.remove(store, rid),
        }
    }

    /// Touches every index whose *last* indexed column is `column` and
    /// whose template matches, visiting each index exactly once per call
    /// (spec.md §4.4 `add_rec`/`del_rec`/`add_field`/`del_field`: "same").
    fn touch_column(&mut self, store: &RecordStore, rid: RecordId, column: usize, adding: bool) -> Result<()> {
        let Some(chain) = self.by_column.get(&column) else {
            return Ok(());
        };
        let candidates: Vec<IndexId> = chain.clone();
        for id in candidates {
            let Some(entry) = self.indexes.get(id.0) else { continue };
            if entry.last_column() != column {
                continue;
            }
            if !self.record_matches(store, id, rid) {
                continue;
            }
            if adding {
                self.engine_add(id, store, rid)?;
            } else {
                self.engine_remove(id, store, rid)?;
            }
        }
        Ok(())
    }

    /// `add_rec`: walks every column of `rid`, indexing it into each
    /// index whose last column is reached (spec.md §4.4).
    pub fn add_rec(&mut self, store: &RecordStore, rid: RecordId) -> Result<()> {
        let ncols = store
            .get(rid)
            .ok_or_else(|| WgError::bad_argument(format!("no such record {rid}")))?
            .len();
        for column in 0..ncols {
            self.touch_column(store, rid, column, true)?;
        }
        Ok(())
    }

    /// `del_rec`: symmetric to [`IndexRegistry::add_rec`].
    pub fn del_rec(&mut self, store: &RecordStore, rid: RecordId) -> Result<()> {
        let ncols = store
            .get(rid)
            .ok_or_else(|| WgError::bad_argument(format!("no such record {rid}")))?
            .len();
        for column in 0..ncols {
            self.touch_column(store, rid, column, false)?;
        }
        Ok(())
    }

    /// `add_field(record, column)` (spec.md §4.4): call after the field
    /// has already been written to `store`.
    pub fn add_field(&mut self, store: &RecordStore, rid: RecordId, column: usize) -> Result<()> {
        self.touch_column(store, rid, column, true)
    }

    /// `del_field(record, column)` (spec.md §4.4): call before the field
    /// is overwritten, while `store` still holds the old value.
    pub fn del_field(&mut self, store: &RecordStore, rid: RecordId, column: usize) -> Result<()> {
        self.touch_column(store, rid, column, false)
    }

    /// `column_to_index` (spec.md §4.4): first matching index on the
    /// chain of the lowest-numbered requested column.
    pub fn column_to_index(&self, columns: &[usize], kind: Option<IndexKind>) -> Option<IndexId> {
        let mut cols = columns.to_vec();
        cols.sort_unstable();
        let first = *cols.first()?;
        let chain = self.by_column.get(&first)?;
        chain.iter().copied().find(|&id| {
            self.indexes
                .get(id.0)
                .map(|e| e.columns == cols && kind.map(|k| k == e.kind).unwrap_or(true))
                .unwrap_or(false)
        })
    }

    pub fn kind_of(&self, id: IndexId) -> Option<IndexKind> {
        self.indexes.get(id.0).map(|e| e.kind)
    }

    pub fn columns_of(&self, id: IndexId) -> Option<&[usize]> {
        self.indexes.get(id.0).map(|e| e.columns.as_slice())
    }

    pub fn template_of(&self, id: IndexId) -> Option<TemplateId> {
        self.indexes.get(id.0).and_then(|e| e.template)
    }

    pub fn template(&self, id: TemplateId) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn ttree(&self, id: IndexId) -> Option<&TTreeIndex> {
        match &self.indexes.get(id.0)?.engine {
            Engine::TTree(t) => Some(t),
            Engine::Hash(_) => None,
        }
    }

    pub fn hash(&self, id: IndexId) -> Option<&HashIndex> {
        match &self.indexes.get(id.0)?.engine {
            Engine::Hash(h) => Some(h),
            Engine::TTree(_) => None,
        }
    }

    /// Indexes on `column`, best (most template-specific) first.
    pub fn chain_for_column(&self, column: usize) -> &[IndexId] {
        self.by_column.get(&column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_indexes(&self) -> impl Iterator<Item = IndexId> + '_ {
        self.indexes.iter().map(|(i, _)| IndexId(i))
    }
}

#[cfg(test)]
#[path = "index_registry_test.rs"]
mod index_registry_test;

//! Top-level orchestrator wiring the record store, index registry, and
//! query engine into the public API surface (spec.md §6). Grounded on the
//! teacher's `bogn.rs` orchestrator-struct style: one struct owning every
//! collaborator, thin methods delegating to each.

use crate::error::Result;
use crate::ids::{IndexId, RecordId, TemplateId};
use crate::index_registry::{IndexKind, IndexRegistry};
use crate::json_query::{self, Clause};
use crate::options::Options;
use crate::query::{Arg, Query};
use crate::record::{Meta, Record, RecordStore};
use crate::schema;
use crate::value::Value;

/// Owns the record store and index registry and exposes every operation
/// named in spec.md §6's "External interfaces": record mutation (kept in
/// lockstep with every live index), index management, the query engine,
/// and the schema/document layer.
pub struct Database {
    options: Options,
    records: RecordStore,
    indexes: IndexRegistry,
}

impl Database {
    pub fn new() -> Self {
        Database::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Database {
            indexes: IndexRegistry::new(&options),
            records: RecordStore::new(),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    // ---- records ----

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    /// Inserts a plain record, indexing it unless it's hidden
    /// (`notdata|match`, spec.md §3).
    pub fn insert(&mut self, fields: Vec<Value>, meta: Meta) -> Result<RecordId> {
        let rid = self.records.insert(Record::new(fields, meta));
        if !meta.is_hidden_from_scan() {
            self.indexes.add_rec(&self.records, rid)?;
        }
        Ok(rid)
    }

    /// Sets a field, keeping every index in lockstep (spec.md §5: "every
    /// mutation that changes a field's value must call `del_field` before
    /// the change and `add_field` after").
    pub fn set_field(&mut self, id: RecordId, column: usize, value: Value) -> Result<Value> {
        self.indexes.del_field(&self.records, id, column)?;
        let old = self.records.set_field(id, column, value)?;
        self.indexes.add_field(&self.records, id, column)?;
        Ok(old)
    }

    pub fn remove(&mut self, id: RecordId) -> Result<()> {
        self.indexes.del_rec(&self.records, id)?;
        self.records.remove(id);
        Ok(())
    }

    // ---- indexes ----

    pub fn create_index(&mut self, columns: Vec<usize>, kind: IndexKind, template: Option<Vec<Value>>) -> Result<IndexId> {
        self.indexes.create(&self.records, columns, kind, template)
    }

    pub fn drop_index(&mut self, id: IndexId) -> Result<()> {
        self.indexes.drop_index(id)
    }

    pub fn column_to_index(&self, columns: &[usize], kind: Option<IndexKind>) -> Option<IndexId> {
        self.indexes.column_to_index(columns, kind)
    }

    pub fn get_index_type(&self, id: IndexId) -> Option<IndexKind> {
        self.indexes.kind_of(id)
    }

    pub fn get_index_template(&self, id: IndexId) -> Option<TemplateId> {
        self.indexes.template_of(id)
    }

    pub fn get_all_indexes(&self) -> Vec<IndexId> {
        self.indexes.all_indexes().collect()
    }

    // ---- queries ----

    pub fn make_query(&self, match_record: Option<&[Value]>, arglist: Vec<Arg>) -> Query {
        Query::new(&self.records, &self.indexes, match_record, arglist)
    }

    pub fn make_query_with_limit(&self, match_record: Option<&[Value]>, arglist: Vec<Arg>, rowlimit: usize) -> Query {
        Query::with_limit(&self.records, &self.indexes, match_record, arglist, Some(rowlimit))
    }

    pub fn make_json_query(&self, clauses: Vec<Clause>) -> Query {
        Query::from_result_set(json_query::run(&self.records, &self.options, clauses))
    }

    // ---- schema / document layer ----

    pub fn create_triple(&mut self, s: Value, p: Value, o: Value, isparam: bool) -> Result<RecordId> {
        schema::create_triple(&mut self.records, &mut self.indexes, s, p, o, isparam)
    }

    pub fn create_kvpair(&mut self, k: Value, v: Value, isparam: bool) -> Result<RecordId> {
        schema::create_kvpair(&mut self.records, &mut self.indexes, k, v, isparam)
    }

    pub fn create_array(&mut self, fields: Vec<Value>, isdocument: bool, isparam: bool) -> Result<RecordId> {
        schema::create_array(&mut self.records, &mut self.indexes, fields, isdocument, isparam)
    }

    pub fn create_object(&mut self, fields: Vec<Value>, isdocument: bool, isparam: bool) -> Result<RecordId> {
        schema::create_object(&mut self.records, &mut self.indexes, fields, isdocument, isparam)
    }

    pub fn find_document(&self, rec: RecordId) -> Option<RecordId> {
        schema::find_document(&self.records, rec, self.options.max_document_depth)
    }

    pub fn delete_document(&mut self, doc: RecordId) -> Result<usize> {
        schema::delete_document(&mut self.records, &mut self.indexes, doc)
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::new()
    }
}

#[cfg(test)]
#[path = "db_test.rs"]
mod db_test;

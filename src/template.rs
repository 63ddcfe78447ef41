//! Index templates (spec.md §3 "Index template", §4.4). Grounded on
//! `dbindex.c`'s `wg_index_add_rec` template matching; deduplication and
//! refcounting follow the same `arena.rs` slab pattern used for records
//! and T-nodes rather than a raw offset table.

use crate::arena::Slab;
use crate::compare::compare;
use crate::ids::TemplateId;
use crate::record::Record;
use crate::value::Value;

/// A match-record: some fields fixed, others wildcard (`Value::Var`).
/// A record "matches" iff its length agrees and every fixed position
/// compares equal (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    fields: Vec<Value>,
}

impl Template {
    pub fn new(fields: Vec<Value>) -> Template {
        Template { fields }
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Number of non-wildcard positions, used to order a column's
    /// template chain descending so index-picking can short-circuit
    /// (spec.md §3).
    pub fn fixed_count(&self) -> usize {
        self.fields.iter().filter(|v| !matches!(v, Value::Var(_))).count()
    }

    pub fn matches(&self, record: &Record) -> bool {
        if record.len() != self.fields.len() {
            return false;
        }
        self.fields
            .iter()
            .zip(record.fields.iter())
            .all(|(t, v)| matches!(t, Value::Var(_)) || compare(t, v, None) == std::cmp::Ordering::Equal)
    }
}

/// Owns every distinct template, deduplicated by structural equality and
/// refcounted the way the index registry's per-column chains are
/// expected to share one template object across several indexes
/// (spec.md §3 "Templates are deduplicated").
#[derive(Debug, Default)]
pub struct TemplateStore {
    slots: Slab<(Template, u32)>,
}

impl TemplateStore {
    pub fn new() -> Self {
        TemplateStore::default()
    }

    pub fn get(&self, id: TemplateId) -> Option<&Template> {
        self.slots.get(id.0).map(|(t, _)| t)
    }

    pub fn refcount(&self, id: TemplateId) -> u32 {
        self.slots.get(id.0).map(|(_, rc)| *rc).unwrap_or(0)
    }

    /// Returns the id of an existing structurally-identical template
    /// (bumping its refcount) or allocates a new one with refcount 1.
    pub fn intern(&mut self, fields: Vec<Value>) -> TemplateId {
        let candidate = Template::new(fields);
        let existing = self.slots.iter().find(|(_, (t, _))| *t == candidate).map(|(id, _)| id);
        if let Some(id) = existing {
            if let Some((_, rc)) = self.slots.get_mut(id) {
                *rc += 1;
            }
            return TemplateId(id);
        }
        TemplateId(self.slots.insert((candidate, 1)))
    }

    /// Drops a reference; frees the template once its refcount reaches
    /// zero (spec.md §4.4 `drop`: "decrement template refcount and
    /// remove the template if it reaches zero"). Returns `true` if the
    /// template was actually freed.
    pub fn release(&mut self, id: TemplateId) -> bool {
        let Some((_, rc)) = self.slots.get_mut(id.0) else {
            return false;
        };
        *rc -= 1;
        if *rc == 0 {
            self.slots.remove(id.0);
            return true;
        }
        false
    }
}

#[cfg(test)]
#[path = "template_test.rs"]
mod template_test;

//! The query engine: argument normalisation, index-plan scoring, and
//! T-tree/full-scan execution with prefetch materialisation (spec.md
//! §4.5). Grounded on `dbquery.c`'s scoring table and bound-folding
//! algorithm; the prefetch result set is `mempool::ResultSet`.

use std::cmp::Ordering;

use crate::compare::compare;
use crate::ids::{IndexId, RecordId};
use crate::index_registry::{IndexKind, IndexRegistry};
use crate::mempool::{Position, ResultSet};
use crate::record::RecordStore;
use crate::value::Value;

/// Condition codes, spec.md §6: `EQ=1, NE=2, LT=4, GT=8, LE=16, GE=32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Condition {
    pub fn code(self) -> u8 {
        match self {
            Condition::Eq => 1,
            Condition::Ne => 2,
            Condition::Lt => 4,
            Condition::Gt => 8,
            Condition::Le => 16,
            Condition::Ge => 32,
        }
    }
}

/// One normalised `{column, condition, value}` argument (spec.md §4.5
/// "Input").
#[derive(Debug, Clone)]
pub struct Arg {
    pub column: usize,
    pub condition: Condition,
    pub value: Value,
}

impl Arg {
    pub fn new(column: usize, condition: Condition, value: Value) -> Arg {
        Arg { column, condition, value }
    }
}

/// Combines an optional match record's fixed slots (each non-wildcard
/// slot becomes an `EQ` argument) with an explicit argument list into the
/// unified argument list the plan selector scores (spec.md §4.5
/// "Argument normalisation").
pub fn normalize(match_record: Option<&[Value]>, arglist: Vec<Arg>) -> Vec<Arg> {
    let mut args = Vec::new();
    if let Some(fields) = match_record {
        for (column, field) in fields.iter().enumerate() {
            if !matches!(field, Value::Var(_)) {
                args.push(Arg::new(column, Condition::Eq, field.clone()));
            }
        }
    }
    args.extend(arglist);
    args
}

/// Per-argument contribution to a column's plan score (spec.md §4.5
/// "Plan scoring"): `EQ` scores 5 (4 for a `NULL` value), any bound
/// scores 2, `NE`/unknown scores 0.
fn condition_score(condition: Condition, value: &Value) -> i32 {
    match condition {
        Condition::Eq => {
            if value.is_null() {
                4
            } else {
                5
            }
        }
        Condition::Lt | Condition::Gt | Condition::Le | Condition::Ge => 2,
        Condition::Ne => 0,
    }
}

struct Plan {
    column: usize,
    index: IndexId,
}

/// A templated index is usable for a query only if every one of the
/// template's fixed positions is pinned by an `EQ` argument in the same
/// query (spec.md §4.4 "template-restricted index").
fn template_compatible(args: &[Arg], template: &crate::template::Template) -> bool {
    template.fields().iter().enumerate().all(|(col, field)| {
        matches!(field, Value::Var(_))
            || args
                .iter()
                .any(|a| a.column == col && a.condition == Condition::Eq && compare(&a.value, field, None) == Ordering::Equal)
    })
}

/// Picks the best T-tree-backed column (spec.md §4.5 "Plan selection"
/// steps 1-2): sum per-column condition scores, skip template-restricted
/// indexes the query's arguments don't satisfy, add a template-match
/// bonus proportional to specificity, and take the column with the
/// highest score. Returns `None` when no column has a usable index (the
/// caller falls back to a full scan).
fn select_plan(args: &[Arg], registry: &IndexRegistry) -> Option<Plan> {
    let mut columns: Vec<usize> = args.iter().map(|a| a.column).collect();
    columns.sort_unstable();
    columns.dedup();

    let mut best: Option<(i32, Plan)> = None;
    for column in columns {
        let base_score: i32 = args
            .iter()
            .filter(|a| a.column == column)
            .map(|a| condition_score(a.condition, &a.value))
            .sum();

        for &id in registry.chain_for_column(column) {
            if !matches!(registry.kind_of(id), Some(IndexKind::TTree) | Some(IndexKind::TTreeJson)) {
                continue;
            }
            let mut score = base_score;
            if let Some(template_id) = registry.template_of(id) {
                let Some(template) = registry.template(template_id) else {
                    continue;
                };
                if !template_compatible(args, template) {
                    continue;
                }
                score += template.fixed_count() as i32;
            }
            if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, Plan { column, index: id }));
            }
            // chain_for_column is already sorted by descending template
            // specificity, so the first compatible T-tree on this column
            // is also the best one available for it.
            break;
        }
    }

    best.map(|(_, plan)| plan)
}

/// An inclusive/exclusive bound value.
type Bound = Option<(Value, bool)>;

/// The tightest `(value, inclusive)` upper bound between `current` and a
/// newly folded-in one (spec.md §4.5 "fold all arguments on the chosen
/// column into the tightest bound").
fn tighter_upper(current: Bound, value: Value, inclusive: bool) -> Bound {
    match current {
        None => Some((value, inclusive)),
        Some((existing, existing_incl)) => match compare(&value, &existing, None) {
            Ordering::Less => Some((value, inclusive)),
            Ordering::Greater => Some((existing, existing_incl)),
            Ordering::Equal => Some((value, inclusive && existing_incl)),
        },
    }
}

fn tighter_lower(current: Bound, value: Value, inclusive: bool) -> Bound {
    match current {
        None => Some((value, inclusive)),
        Some((existing, existing_incl)) => match compare(&value, &existing, None) {
            Ordering::Greater => Some((value, inclusive)),
            Ordering::Less => Some((existing, existing_incl)),
            Ordering::Equal => Some((value, inclusive && existing_incl)),
        },
    }
}

/// Folds every argument on `column` into one `(lo, hi)` bound pair. `NE`
/// arguments never tighten a bound — they stay in the residual per-row
/// check while the index is still used for ordering (spec.md §4.5 "an NE
/// argument on the chosen column falls back to a per-row check").
fn fold_bounds(args: &[Arg], column: usize) -> (Bound, Bound) {
    let mut lo = None;
    let mut hi = None;
    for arg in args.iter().filter(|a| a.column == column) {
        match arg.condition {
            Condition::Eq => {
                lo = Some((arg.value.clone(), true));
                hi = Some((arg.value.clone(), true));
            }
            Condition::Lt => hi = tighter_upper(hi, arg.value.clone(), false),
            Condition::Le => hi = tighter_upper(hi, arg.value.clone(), true),
            Condition::Gt => lo = tighter_lower(lo, arg.value.clone(), false),
            Condition::Ge => lo = tighter_lower(lo, arg.value.clone(), true),
            Condition::Ne => {}
        }
    }
    (lo, hi)
}

fn arg_satisfied(store: &RecordStore, record: &crate::record::Record, arg: &Arg) -> bool {
    let Some(value) = record.get(arg.column) else {
        return false;
    };
    let c = compare(value, &arg.value, Some(store));
    match arg.condition {
        Condition::Eq => c == Ordering::Equal,
        Condition::Ne => c != Ordering::Equal,
        Condition::Lt => c == Ordering::Less,
        Condition::Gt => c == Ordering::Greater,
        Condition::Le => c != Ordering::Greater,
        Condition::Ge => c != Ordering::Less,
    }
}

fn satisfies(store: &RecordStore, record: &crate::record::Record, args: &[&Arg]) -> bool {
    args.iter().all(|a| arg_satisfied(store, record, a))
}

/// Runs the plan (T-tree range scan plus residual re-check, or a full
/// scan) and materialises every matching record into a prefetch
/// [`ResultSet`], stopping early once `limit` rows are found (spec.md
/// §4.5 "Execution" and "Prefetch variant").
fn execute(store: &RecordStore, registry: &IndexRegistry, args: &[Arg], limit: Option<usize>) -> ResultSet {
    let mut results = ResultSet::new();

    if let Some(plan) = select_plan(args, registry) {
        let tree = registry.ttree(plan.index).expect("select_plan only returns T-tree indexes");
        let (lo, hi) = fold_bounds(args, plan.column);
        let lo_val = lo.as_ref().map(|(v, _)| v);
        let hi_val = hi.as_ref().map(|(v, _)| v);
        let incl_lo = lo.as_ref().map(|(_, i)| *i).unwrap_or(true);
        let incl_hi = hi.as_ref().map(|(_, i)| *i).unwrap_or(true);
        let cursor = tree.range(store, lo_val, hi_val, incl_lo, incl_hi);

        let residual: Vec<&Arg> = args
            .iter()
            .filter(|a| a.column != plan.column || a.condition == Condition::Ne)
            .collect();

        for rid in tree.iter(cursor) {
            let Some(record) = store.get(rid) else { continue };
            if satisfies(store, record, &residual) {
                results.push(rid);
                if limit.map(|n| results.len() >= n).unwrap_or(false) {
                    break;
                }
            }
        }
    } else {
        let all: Vec<&Arg> = args.iter().collect();
        for (rid, record) in store.iter_visible() {
            if satisfies(store, record, &all) {
                results.push(rid);
                if limit.map(|n| results.len() >= n).unwrap_or(false) {
                    break;
                }
            }
        }
    }

    results
}

/// A materialised query result, fetched one record at a time through an
/// independent, rewindable cursor (spec.md §6 "Query public API":
/// `make_query`/`make_query_with_limit`/`fetch`/`free_query`; `free_query`
/// needs no explicit action here since dropping a `Query` frees its
/// pages).
pub struct Query {
    results: ResultSet,
    pos: Position,
}

impl Query {
    pub fn new(store: &RecordStore, registry: &IndexRegistry, match_record: Option<&[Value]>, arglist: Vec<Arg>) -> Query {
        Query::with_limit(store, registry, match_record, arglist, None)
    }

    pub fn with_limit(
        store: &RecordStore,
        registry: &IndexRegistry,
        match_record: Option<&[Value]>,
        arglist: Vec<Arg>,
        limit: Option<usize>,
    ) -> Query {
        let args = normalize(match_record, arglist);
        let results = execute(store, registry, &args, limit);
        let pos = results.start();
        Query { results, pos }
    }

    /// Wraps an already-materialised [`ResultSet`] in the same
    /// fetch/rewind cursor `make_query`/`make_query_with_limit` return
    /// (spec.md §6 "Query public API"), so `make_json_query`'s result can
    /// be driven through `fetch` like every other query.
    pub fn from_result_set(results: ResultSet) -> Query {
        let pos = results.start();
        Query { results, pos }
    }

    pub fn fetch(&mut self) -> Option<RecordId> {
        self.results.fetch(&mut self.pos)
    }

    pub fn rewind(&mut self) {
        self.pos = self.results.start();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;

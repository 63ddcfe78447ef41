//! Tunable constants, grounded on `hackwave-segurodb`'s `src/options.rs`
//! shape: a single plain-data struct with a `::default()` plus a builder
//! for tests that want to exercise small-N edge cases.

/// T-tree node array capacity when nodes carry predecessor/successor
/// chain links ("chained"), spec.md §3.
pub const TTREE_CHAINED_NODE_SIZE: usize = 8;

/// T-tree node array capacity otherwise, spec.md §3.
pub const TTREE_NODE_SIZE: usize = 10;

/// Underflow threshold for internal-node delete rebalance, spec.md §4.2
/// step 3 ("5 with default N").
pub const TTREE_UNDERFLOW_THRESHOLD: usize = 5;

/// Highest column number that may carry an index, spec.md §6.
pub const MAX_INDEXED_FIELDNR: usize = 255;

/// Highest number of columns a single index may cover, spec.md §3.
pub const MAX_INDEX_FIELDS: usize = 8;

/// JSON query: below this many candidate rows, clause-local
/// set-uniqueness is nested-loop; at/above it, hash-based. spec.md
/// §4.5.1 step 3.
pub const JSON_DEDUP_CROSSOVER: usize = 20;

/// JSON query: below this many expected inner iterations, intersection
/// with the running result set is nested-loop; at/above it, hash-join.
/// spec.md §4.5.1 step 4.
pub const JSON_INTERSECT_CROSSOVER: usize = 200;

/// Recursion bound for `find_document` backlink walks and the JSON
/// query's "scan an intermediate result set recursively" step. SPEC_FULL
/// §11.
pub const MAX_DOCUMENT_DEPTH: usize = 64;

/// Result-set page size (number of record offsets per mempool page),
/// spec.md §9 design note.
pub const QUERY_PAGE_SIZE: usize = 64;

/// Runtime-tunable knobs. Constructed via [`Options::default`] or
/// [`OptionsBuilder`] when a test needs a tiny `ttree_node_size` to force
/// rotations/splits on small fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub ttree_node_size: usize,
    pub ttree_chained_node_size: usize,
    pub ttree_underflow_threshold: usize,
    pub max_index_fields: usize,
    pub max_indexed_fieldnr: usize,
    pub json_dedup_crossover: usize,
    pub json_intersect_crossover: usize,
    pub max_document_depth: usize,
    pub query_page_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            ttree_node_size: TTREE_NODE_SIZE,
            ttree_chained_node_size: TTREE_CHAINED_NODE_SIZE,
            ttree_underflow_threshold: TTREE_UNDERFLOW_THRESHOLD,
            max_index_fields: MAX_INDEX_FIELDS,
            max_indexed_fieldnr: MAX_INDEXED_FIELDNR,
            json_dedup_crossover: JSON_DEDUP_CROSSOVER,
            json_intersect_crossover: JSON_INTERSECT_CROSSOVER,
            max_document_depth: MAX_DOCUMENT_DEPTH,
            query_page_size: QUERY_PAGE_SIZE,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder(Options::default())
    }
}

/// Builder for [`Options`]; every setter returns `Self` for chaining.
#[derive(Debug, Clone, Copy)]
pub struct OptionsBuilder(Options);

impl OptionsBuilder {
    pub fn ttree_node_size(mut self, n: usize) -> Self {
        self.0.ttree_node_size = n;
        self
    }

    pub fn ttree_underflow_threshold(mut self, n: usize) -> Self {
        self.0.ttree_underflow_threshold = n;
        self
    }

    pub fn max_index_fields(mut self, n: usize) -> Self {
        self.0.max_index_fields = n;
        self
    }

    pub fn build(self) -> Options {
        self.0
    }
}

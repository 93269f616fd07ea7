mod kb;
mod path_index;
mod persistence;
mod predicate_index;
mod tms;

pub use kb::KnowledgeBase;
pub use path_index::PathIndex;
pub use persistence::{FilePersistence, InMemoryPersistence, Persistence};
pub use predicate_index::PredicateIndex;
pub use tms::{compute_active, propagate, Dependents};

//! Collection aliases shared across the workspace.

pub use smallvec::SmallVec;

pub type DefaultHashBuilder = foldhash::fast::RandomState;

pub type HashMap<K, V> = hashbrown::HashMap<K, V, DefaultHashBuilder>;

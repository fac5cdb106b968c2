//! Transform implementations for record tables

mod dataset_merger;

pub use dataset_merger::{
    DatasetMerger, JoinPolicy, MergeError, MergeInput, SchemaMismatch, merge,
};

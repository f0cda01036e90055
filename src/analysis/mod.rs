pub mod aggregate;
pub mod compare;
pub mod reconcile;
pub mod report;

pub use aggregate::PropertyDataset;
pub use compare::compare_to_reference;
pub use report::run_analysis;

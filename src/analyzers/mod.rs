//! Exam result aggregation.
//!
//! This module computes per-year grade means grouped by one or two
//! categorical fields, bins grades into fixed intervals, and pivots the
//! resulting histogram into count and percentage tables.

pub mod bins;
pub mod means;
pub mod pivot;
pub mod types;
pub mod utility;

pub use bins::{GradeBins, bin_grades};
pub use means::{
    CategoryOrder, compute_grouped_mean, compute_grouped_mean_ordered,
    compute_grouped_mean_two_keys,
};
pub use pivot::{build_pivot, to_percentage};

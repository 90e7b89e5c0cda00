//! Data shaping between raw statistics and charts.
//!
//! - [`date_range`]: the dense day axis every time series is drawn on
//! - [`reconcile`]: fill sparse rows against that axis
//! - [`gather`]: concurrent per-entity fetch that survives partial failure
//! - [`filter`]: "all"/single-entity selection and secondary-key grouping
//! - [`rollup`]: card totals and trailing-window change

pub mod date_range;
pub mod filter;
pub mod gather;
pub mod reconcile;
pub mod rollup;

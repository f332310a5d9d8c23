//! Statistical summaries for design-space sampling.
//!
//! - [`descriptive`]: min, max, mean, median, variance and spread of a sample
//! - [`percentiles`]: nearest-rank percentiles at chosen points
//!
//! Both operate on `f64` samples and skip nothing: callers decide what to do with
//! non-finite values (constraint margins may legitimately be `+∞`).
//!
//! # Examples
//!
//! ```
//! use rotorlab_stats::descriptive::DescriptiveStats;
//!
//! let stats = DescriptiveStats::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ```
//! use rotorlab_stats::percentiles::Percentiles;
//!
//! let percentiles = Percentiles::new(&[1.0, 2.0, 3.0, 4.0, 5.0], &[25.0, 50.0, 75.0]);
//! assert_eq!(percentiles.get(50.0), Some(3.0));
//! ```

pub mod descriptive;
pub mod percentiles;

//! Streaming compression of (timestamp, value) samples in the style of Facebook's Gorilla
//! paper: delta of delta timestamps and XORed floating point values.
//!
//! ```
//! use tsz::Series;
//!
//! let series = Series::new(1_427_176_800);
//! series.push(1_427_176_862, 12.0);
//! series.push(1_427_176_922, 12.0);
//! series.push(1_427_176_982, 24.0);
//!
//! let points: Vec<_> = series.iter().map(|p| (p.t, p.v)).collect();
//! assert_eq!(points[2], (1_427_176_982, 24.0));
//! ```
pub mod compression;
pub mod error;
mod series;

pub use error::{Error, Result};
pub use series::*;

//! Transform engine.
//!
//! Three stateless operations on a [`Table`](crate::models::Table):
//! - Category: split rows by compound-ID suffix (PC / LPC / plasmalogen)
//! - Retention: round the retention time to a whole minute
//! - Mean: average every column per rounded retention time

pub mod category;
pub mod mean;
pub mod retention;

pub use category::{split_categories, Category, CategorySplit};
pub use mean::grouped_mean;
pub use retention::{round_retention, round_to_nearest};

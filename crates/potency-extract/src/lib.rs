//! Extraction, canonicalization, merging and ranking of potency data.
//!
//! Every function here is synchronous and pure apart from [`InsightStore`],
//! which guards its per-entity slots with mutexes. Malformed input never
//! produces an error; it degrades to unknown or absent values.

pub mod canonical;
pub mod error;
mod fold;
pub mod merge;
pub mod percent;
pub mod proximity;
pub mod rank;
pub mod store;
pub mod structural;
pub mod text;

pub use canonical::{canonicalize, display_name, TerpeneName, CANONICAL_TERPENES};
pub use error::{CompareError, StoreError};
pub use merge::{merge, merge_into};
pub use percent::{parse_percent, parse_percent_str};
pub use proximity::{extract_by_proximity, PercentNode};
pub use rank::{compare, rank_values, Comparison, ComparisonRow, RankTier};
pub use store::InsightStore;
pub use structural::{extract_cannabinoids, extract_insight, extract_terpenes, ExtractOptions};
pub use text::{extract_from_page, PageContent};

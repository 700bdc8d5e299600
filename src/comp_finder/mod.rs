mod comp_finder;
mod comp_finder_types;
mod dedup;
mod eligibility;
pub mod fields;
mod geo_tier;
mod ranking;

pub use self::comp_finder::{prepare_dataset, CompFinder};
pub use self::comp_finder_types::{CompMatch, FieldValue, PropertyRecord};
pub use self::fields::{FieldSet, PropertyCategory};
pub use self::ranking::SortMode;

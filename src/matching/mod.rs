pub mod engine;
pub mod ingredients;
pub mod tags;

pub use engine::{find_matching_meals, Choice, ChoiceSet, ChoiceSetError};
pub use ingredients::{is_satisfiable, StockSet};
pub use tags::{canonical_tag, classify, TagBuckets, TagCategory};

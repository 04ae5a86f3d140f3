use serde::Serialize;

pub const HEALTH_TAGS: [&str; 2] = ["healthy", "regular"];
pub const MEAL_TIME_TAGS: [&str; 3] = ["breakfast", "lunch", "dinner"];
pub const GENRE_TAGS: [&str; 3] = ["dairy", "parve", "meaty"];

/// Every canonical tag value, lower-cased. This is the "surprise me" choice set.
pub const ALL_TAGS: [&str; 8] = [
    "healthy",
    "regular",
    "breakfast",
    "lunch",
    "dinner",
    "dairy",
    "parve",
    "meaty",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    Health,
    MealTime,
    Genre,
}

impl TagCategory {
    pub const ALL: [TagCategory; 3] = [Self::Health, Self::MealTime, Self::Genre];

    /// Category of a single tag, ignoring case. `None` for unknown tags.
    pub fn of(tag: &str) -> Option<Self> {
        let tag = tag.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.values().contains(&tag.as_str()))
    }

    pub fn values(self) -> &'static [&'static str] {
        match self {
            Self::Health => &HEALTH_TAGS,
            Self::MealTime => &MEAL_TIME_TAGS,
            Self::Genre => &GENRE_TAGS,
        }
    }
}

/// A meal's tags split per category, lower-cased, in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagBuckets {
    pub health: Vec<String>,
    pub meal_time: Vec<String>,
    pub genre: Vec<String>,
}

impl TagBuckets {
    pub fn bucket(&self, category: TagCategory) -> &[String] {
        match category {
            TagCategory::Health => &self.health,
            TagCategory::MealTime => &self.meal_time,
            TagCategory::Genre => &self.genre,
        }
    }
}

pub fn classify<S: AsRef<str>>(tags: &[S]) -> TagBuckets {
    let mut buckets = TagBuckets::default();
    for tag in tags {
        let tag = tag.as_ref().to_lowercase();
        match TagCategory::of(&tag) {
            Some(TagCategory::Health) => buckets.health.push(tag),
            Some(TagCategory::MealTime) => buckets.meal_time.push(tag),
            Some(TagCategory::Genre) => buckets.genre.push(tag),
            None => {}
        }
    }
    buckets
}

/// Normalizes a tag for storage: `"  bREAKfast "` becomes `"Breakfast"`.
pub fn canonical_tag(tag: &str) -> String {
    let lower = tag.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

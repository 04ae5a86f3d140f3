use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    ingredients::{all_satisfiable, StockSet},
    tags::{classify, TagCategory, ALL_TAGS},
};
use crate::{meals::repo_types::Meal, pantry::repo_types::PantryItem};

pub const MAX_CHOICES: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChoiceSetError {
    #[error("at most 3 choices may be given, got {0}")]
    TooMany(usize),
}

/// What the user asked for: explicit choices or the "surprise me" wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Choice {
    Filter { choices: Vec<String> },
    Surprise,
}

impl Choice {
    pub fn filter<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Filter {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn into_choice_set(self) -> Result<ChoiceSet, ChoiceSetError> {
        match self {
            Choice::Filter { choices } => ChoiceSet::new(choices),
            Choice::Surprise => Ok(ChoiceSet::surprise()),
        }
    }
}

/// Lower-cased, de-duplicated set of requested tag values.
///
/// Built per request and passed explicitly; nothing about a previous request
/// leaks into the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    values: BTreeSet<String>,
}

impl ChoiceSet {
    pub fn new<I, S>(choices: I) -> Result<Self, ChoiceSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: BTreeSet<String> = choices
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        if values.len() > MAX_CHOICES {
            return Err(ChoiceSetError::TooMany(values.len()));
        }
        Ok(Self { values })
    }

    pub fn from_choices(health: &str, meal_time: &str, genre: &str) -> Self {
        Self {
            values: [health, meal_time, genre]
                .iter()
                .map(|c| c.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn surprise() -> Self {
        Self {
            values: ALL_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-axis outcome for one meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MealVerdict {
    pub health: bool,
    pub meal_time: bool,
    pub genre: bool,
    pub ingredients: bool,
}

impl MealVerdict {
    pub fn is_match(&self) -> bool {
        self.health && self.meal_time && self.genre && self.ingredients
    }
}

pub fn evaluate(meal: &Meal, stock: &StockSet, choices: &ChoiceSet) -> MealVerdict {
    let buckets = classify(&meal.tags);
    let axis = |category: TagCategory| {
        buckets
            .bucket(category)
            .iter()
            .any(|tag| choices.contains(tag))
    };

    MealVerdict {
        health: axis(TagCategory::Health),
        meal_time: axis(TagCategory::MealTime),
        genre: axis(TagCategory::Genre),
        ingredients: all_satisfiable(&meal.ingredients, stock),
    }
}

/// Meals the owner can make right now, in input order, each at most once.
///
/// A meal qualifies when each of the three tag axes has a tag the user chose
/// and every ingredient is covered by the in-stock pantry. Drafts are skipped.
pub fn find_matching_meals(
    meals: &[Meal],
    pantry: &[PantryItem],
    choices: &ChoiceSet,
) -> Vec<Meal> {
    let stock = StockSet::from_items(pantry);

    let matched: Vec<Meal> = meals
        .iter()
        .filter(|meal| meal.confirmed)
        .filter(|meal| {
            let verdict = evaluate(meal, &stock, choices);
            if !verdict.is_match() {
                debug!(meal_id = %meal.id, ?verdict, "meal filtered out");
            }
            verdict.is_match()
        })
        .cloned()
        .collect();

    debug!(
        candidates = meals.len(),
        stock = stock.len(),
        matched = matched.len(),
        "meal matching done"
    );
    matched
}

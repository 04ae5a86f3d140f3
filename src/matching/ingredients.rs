use std::collections::HashSet;

use crate::pantry::repo_types::PantryItem;

/// Lower-cased names of the items an owner currently has in stock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockSet(HashSet<String>);

impl StockSet {
    /// Builds the set from pantry items, skipping anything saved for later.
    pub fn from_items(items: &[PantryItem]) -> Self {
        Self(
            items
                .iter()
                .filter(|item| item.in_stock)
                .map(|item| item.name.to_lowercase())
                .collect(),
        )
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|n| n.as_ref().to_lowercase()).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Whether a required ingredient is covered by the stock.
///
/// The three spelling rules are evaluated one after another and each may turn
/// a miss into a hit: exact name, naive plural (`egg` -> `eggs`), naive
/// singular (`tomatoes` -> `tomatoe`).
pub fn is_satisfiable(ingredient: &str, stock: &StockSet) -> bool {
    let wanted = ingredient.to_lowercase();

    let mut found = stock.contains(&wanted);

    let plural = format!("{wanted}s");
    if stock.contains(&plural) {
        found = true;
    }

    let mut singular = wanted.clone();
    singular.pop();
    if stock.contains(&singular) {
        found = true;
    }

    found
}

pub fn all_satisfiable<S: AsRef<str>>(ingredients: &[S], stock: &StockSet) -> bool {
    ingredients
        .iter()
        .all(|ingredient| is_satisfiable(ingredient.as_ref(), stock))
}

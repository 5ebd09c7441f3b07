use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OwnerId, TransactionType};

pub type CategoryId = i64;

/// A named grouping of transactions. Categories reuse the transaction kinds.
pub type CategoryType = TransactionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub owner_id: OwnerId,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category. The id is assigned by the repository on save.
    pub fn new(owner_id: OwnerId, name: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id: 0,
            owner_id,
            name: name.into(),
            category_type,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: CategoryId) -> Self {
        self.id = id;
        self
    }
}

/// Validated input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub category_type: CategoryType,
}

impl CategoryDraft {
    pub fn into_category(self, owner_id: OwnerId) -> Category {
        Category::new(owner_id, self.name, self.category_type)
    }
}

/// Build a category id -> name lookup. If an id appears twice the first entry wins.
pub fn category_lookup(categories: &[Category]) -> HashMap<CategoryId, &str> {
    let mut lookup = HashMap::with_capacity(categories.len());
    for category in categories {
        lookup.entry(category.id).or_insert(category.name.as_str());
    }
    lookup
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_category_lookup() {
        let owner = Uuid::new_v4();
        let categories = vec![
            Category::new(owner, "Salary", CategoryType::Income).with_id(1),
            Category::new(owner, "Rent", CategoryType::Expense).with_id(2),
        ];

        let lookup = category_lookup(&categories);

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get(&1), Some(&"Salary"));
        assert_eq!(lookup.get(&2), Some(&"Rent"));
        assert_eq!(lookup.get(&3), None);
    }

    #[test]
    fn test_category_lookup_first_occurrence_wins() {
        let owner = Uuid::new_v4();
        let categories = vec![
            Category::new(owner, "Food", CategoryType::Expense).with_id(5),
            Category::new(owner, "Dining", CategoryType::Expense).with_id(5),
        ];

        let lookup = category_lookup(&categories);

        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.get(&5), Some(&"Food"));
    }
}

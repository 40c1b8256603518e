// src/query/filter.rs
//! Filter expressions in the shape the database query endpoint expects.

use serde::{Deserialize, Serialize};

/// A filter tree: compound groups over property predicates.
///
/// Serializes to exactly the upstream JSON (`{"and": [...]}`,
/// `{"property": "Tags", "multi_select": {"contains": "rust"}}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    And { and: Vec<Filter> },
    Or { or: Vec<Filter> },
    Property(PropertyFilter),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub property: String,
    #[serde(flatten)]
    pub condition: PropertyCondition,
}

/// The predicate applied to one property, keyed by property type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCondition {
    MultiSelect(MultiSelectCondition),
    RichText(TextCondition),
    Checkbox(CheckboxCondition),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiSelectCondition {
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCondition {
    Contains(String),
    Equals(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckboxCondition {
    Equals(bool),
}

/// How the predicates of a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Filter {
    fn property(property: &str, condition: PropertyCondition) -> Self {
        Filter::Property(PropertyFilter {
            property: property.to_string(),
            condition,
        })
    }

    pub fn multi_select_contains(property: &str, value: &str) -> Self {
        Self::property(
            property,
            PropertyCondition::MultiSelect(MultiSelectCondition::Contains(value.to_string())),
        )
    }

    pub fn text_contains(property: &str, value: &str) -> Self {
        Self::property(
            property,
            PropertyCondition::RichText(TextCondition::Contains(value.to_string())),
        )
    }

    pub fn text_equals(property: &str, value: &str) -> Self {
        Self::property(
            property,
            PropertyCondition::RichText(TextCondition::Equals(value.to_string())),
        )
    }

    pub fn checkbox_equals(property: &str, value: bool) -> Self {
        Self::property(
            property,
            PropertyCondition::Checkbox(CheckboxCondition::Equals(value)),
        )
    }

    /// Groups `filters` under `combinator`. An empty group is no filter at all.
    pub fn group(combinator: Combinator, filters: Vec<Filter>) -> Option<Self> {
        if filters.is_empty() {
            return None;
        }
        Some(match combinator {
            Combinator::And => Filter::And { and: filters },
            Combinator::Or => Filter::Or { or: filters },
        })
    }
}

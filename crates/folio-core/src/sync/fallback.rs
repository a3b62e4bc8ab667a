//! Collections and their fallback policy
//!
//! One row per collection: how it is ordered in the store, when its
//! fallback applies, and what the fallback is.

use std::fmt;

use serde::Serialize;

use crate::mapping::keys;
use crate::store::{Order, Table};

/// A named entity collection in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Projects,
    Experience,
    Services,
    Achievements,
    Blogs,
    Testimonials,
    Leads,
    Skills,
    Settings,
}

/// When a collection's fallback replaces the fetched value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Only when the fetch fails
    Failed,
    /// When the fetch fails or returns no rows
    EmptyOrFailed,
    /// When the fetch fails or the single row is missing
    MissingOrFailed,
}

impl Trigger {
    pub fn on_empty(&self) -> bool {
        matches!(self, Trigger::EmptyOrFailed | Trigger::MissingOrFailed)
    }
}

/// What replaces a collection when its trigger fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// An empty list; no substitute data
    Empty,
    /// The built-in skill list
    DefaultSkills,
    /// Built-in values for every settings field
    DefaultSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub collection: Collection,
    pub order: Option<Order>,
    pub trigger: Trigger,
    pub fallback: Fallback,
}

const fn policy(
    collection: Collection,
    order: Option<Order>,
    trigger: Trigger,
    fallback: Fallback,
) -> Policy {
    Policy {
        collection,
        order,
        trigger,
        fallback,
    }
}

const fn desc(column: &'static str) -> Option<Order> {
    Some(Order {
        column,
        ascending: false,
    })
}

const fn asc(column: &'static str) -> Option<Order> {
    Some(Order {
        column,
        ascending: true,
    })
}

/// The full policy table, in fetch order
pub const POLICIES: [Policy; 9] = [
    policy(Collection::Projects, desc(keys::CREATED_AT), Trigger::Failed, Fallback::Empty),
    policy(Collection::Experience, desc(keys::CREATED_AT), Trigger::Failed, Fallback::Empty),
    policy(Collection::Services, asc(keys::CREATED_AT), Trigger::Failed, Fallback::Empty),
    policy(Collection::Achievements, desc(keys::DATE), Trigger::Failed, Fallback::Empty),
    policy(Collection::Blogs, desc(keys::DATE), Trigger::Failed, Fallback::Empty),
    policy(Collection::Testimonials, None, Trigger::Failed, Fallback::Empty),
    policy(Collection::Leads, desc(keys::DATE), Trigger::Failed, Fallback::Empty),
    policy(Collection::Skills, desc(keys::LEVEL), Trigger::EmptyOrFailed, Fallback::DefaultSkills),
    policy(Collection::Settings, None, Trigger::MissingOrFailed, Fallback::DefaultSettings),
];

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Projects,
        Collection::Experience,
        Collection::Services,
        Collection::Achievements,
        Collection::Blogs,
        Collection::Testimonials,
        Collection::Leads,
        Collection::Skills,
        Collection::Settings,
    ];

    pub fn table(&self) -> Table {
        match self {
            Collection::Projects => Table::Projects,
            Collection::Experience => Table::Experience,
            Collection::Services => Table::Services,
            Collection::Achievements => Table::Achievements,
            Collection::Blogs => Table::Blogs,
            Collection::Testimonials => Table::Testimonials,
            Collection::Leads => Table::Leads,
            Collection::Skills => Table::Skills,
            Collection::Settings => Table::SiteSettings,
        }
    }

    pub fn policy(&self) -> &'static Policy {
        // POLICIES is indexed in the same order as ALL
        &POLICIES[*self as usize]
    }

    pub fn order(&self) -> Option<Order> {
        self.policy().order
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table_is_indexed_by_collection() {
        for collection in Collection::ALL {
            assert_eq!(collection.policy().collection, collection);
        }
    }

    #[test]
    fn test_only_skills_and_settings_substitute_data() {
        for policy in POLICIES {
            match policy.collection {
                Collection::Skills => {
                    assert_eq!(policy.trigger, Trigger::EmptyOrFailed);
                    assert_eq!(policy.fallback, Fallback::DefaultSkills);
                }
                Collection::Settings => {
                    assert_eq!(policy.trigger, Trigger::MissingOrFailed);
                    assert_eq!(policy.fallback, Fallback::DefaultSettings);
                }
                _ => {
                    assert_eq!(policy.trigger, Trigger::Failed);
                    assert_eq!(policy.fallback, Fallback::Empty);
                    assert!(!policy.trigger.on_empty());
                }
            }
        }
    }

    #[test]
    fn test_store_ordering() {
        assert_eq!(Collection::Projects.order(), Some(Order::desc("created_at")));
        assert_eq!(Collection::Services.order(), Some(Order::asc("created_at")));
        assert_eq!(Collection::Blogs.order(), Some(Order::desc("date")));
        assert_eq!(Collection::Skills.order(), Some(Order::desc("level")));
        assert_eq!(Collection::Testimonials.order(), None);
    }

    #[test]
    fn test_every_table_has_a_collection() {
        let mut tables: Vec<_> = Collection::ALL.iter().map(|c| c.table()).collect();
        tables.sort();
        let mut all = Table::ALL.to_vec();
        all.sort();
        assert_eq!(tables, all);
    }
}

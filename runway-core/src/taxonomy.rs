//! Closed category taxonomy and the normalizer that maps free-text labels onto it.
//!
//! The table is built once (standard or from config) and passed by reference;
//! nothing mutates it after construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catch-all label for anything the taxonomy does not know.
pub const MISC: &str = "Misc";

/// Taxonomy group a category belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    #[serde(rename = "essential")]
    Essential,
    #[serde(rename = "financial")]
    Financial,
    #[serde(rename = "lifestyle")]
    Lifestyle,
    #[serde(rename = "other")]
    Other,
    #[serde(rename = "income")]
    Income,
}

impl Group {
    /// Declaration order; the first group listing a name owns it.
    pub const ALL: [Group; 5] = [
        Group::Essential,
        Group::Financial,
        Group::Lifestyle,
        Group::Other,
        Group::Income,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Group::Essential => "Essential",
            Group::Financial => "Financial",
            Group::Lifestyle => "Lifestyle",
            Group::Other => "Other",
            Group::Income => "Income",
        }
    }
}

/// Result of normalizing a raw label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized {
    pub category: String,
    pub group: Group,
}

/// Immutable category → group table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    members: BTreeMap<Group, Vec<String>>,
    lookup: BTreeMap<String, Group>,
}

const STANDARD: [(Group, &[&str]); 5] = [
    (
        Group::Essential,
        &[
            "Food", "Bills", "Kontrakan", "Health", "Transportation",
            "Telephone", "Tax", "Insurance", "Baby", "Education",
        ],
    ),
    (Group::Financial, &["Hutang", "Savings", "Investment", "Trading"]),
    (
        Group::Lifestyle,
        &[
            "Beauty", "Clothing", "Electronics", "Entertainment", "Shopping",
            "Social", "Sport", "Car", "Gadgets", "Travel",
        ],
    ),
    (
        Group::Other,
        &["Business", "Home", "Kerugian", "Penyesuaian", "Misc"],
    ),
    (
        Group::Income,
        &[
            "Salary", "Rental", "Sale", "Coupons", "Grants", "Lottery",
            "Orang Tua", "Refunds", "Business", "Trading", "Biaya Sekunder",
        ],
    ),
];

impl Taxonomy {
    /// The built-in MyMoney-style taxonomy.
    pub fn standard() -> Self {
        Self::from_groups(
            STANDARD
                .iter()
                .map(|(g, names)| (*g, names.iter().map(|n| n.to_string()).collect())),
        )
    }

    /// Build from explicit group lists. Names are title-cased; a name listed in
    /// several groups belongs to the earliest one in `Group::ALL` order. "Misc"
    /// is always present under Other and nowhere else.
    pub fn from_groups(groups: impl IntoIterator<Item = (Group, Vec<String>)>) -> Self {
        let mut members: BTreeMap<Group, Vec<String>> = BTreeMap::new();
        for (group, names) in groups {
            let list = members.entry(group).or_default();
            for name in names {
                let name = title_case(name.trim());
                if name.is_empty() || list.contains(&name) {
                    continue;
                }
                if group == Group::Other || name != MISC {
                    list.push(name);
                }
            }
        }

        let other = members.entry(Group::Other).or_default();
        if !other.iter().any(|n| n == MISC) {
            other.push(MISC.to_string());
        }

        let mut lookup = BTreeMap::new();
        for group in Group::ALL {
            if let Some(names) = members.get(&group) {
                for name in names {
                    lookup.entry(name.clone()).or_insert(group);
                }
            }
        }

        Self { members, lookup }
    }

    /// Map a raw label onto the taxonomy. Total: unknown or empty input
    /// becomes "Misc" in group Other.
    pub fn normalize(&self, raw: &str) -> Normalized {
        let titled = title_case(raw.trim());
        match self.lookup.get(&titled) {
            Some(group) => Normalized {
                category: titled,
                group: *group,
            },
            None => Normalized {
                category: MISC.to_string(),
                group: Group::Other,
            },
        }
    }

    /// Group of an already-normalized category, if known
    pub fn group_of(&self, category: &str) -> Option<Group> {
        self.lookup.get(category).copied()
    }

    /// Lifestyle categories are discretionary; everything else is not.
    pub fn is_discretionary(&self, category: &str) -> bool {
        self.group_of(category) == Some(Group::Lifestyle)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.lookup.contains_key(category)
    }

    /// Categories listed under `group`, in declaration order
    pub fn group_members(&self, group: Group) -> &[String] {
        self.members.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union of every category across all groups (sorted, deduplicated)
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.lookup.keys().map(String::as_str)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

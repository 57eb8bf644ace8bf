//! BBOB function groups.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// One of the five fixed partitions of the 24 BBOB functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FunctionGroup {
    /// Separable functions.
    Group1,
    /// Functions with low or moderate conditioning.
    Group2,
    /// Unimodal functions with high conditioning.
    Group3,
    /// Multi-modal functions with adequate global structure.
    Group4,
    /// Multi-modal functions with weak global structure.
    Group5,
}

const MEMBERS: [(FunctionGroup, &[&str]); 5] = [
    (FunctionGroup::Group1, &["f001", "f002", "f003", "f004", "f005"]),
    (FunctionGroup::Group2, &["f006", "f007", "f008", "f009"]),
    (FunctionGroup::Group3, &["f010", "f011", "f012", "f013", "f014"]),
    (FunctionGroup::Group4, &["f015", "f016", "f017", "f018", "f019"]),
    (FunctionGroup::Group5, &["f020", "f021", "f022", "f023", "f024"]),
];

fn lookup() -> &'static HashMap<&'static str, FunctionGroup> {
    static TABLE: OnceLock<HashMap<&'static str, FunctionGroup>> = OnceLock::new();
    TABLE.get_or_init(|| {
        MEMBERS
            .iter()
            .flat_map(|(group, functions)| functions.iter().map(move |f| (*f, *group)))
            .collect()
    })
}

impl FunctionGroup {
    pub const ALL: [FunctionGroup; 5] =
        [Self::Group1, Self::Group2, Self::Group3, Self::Group4, Self::Group5];

    /// Group of a function id such as `f013`.
    pub fn of(function: &str) -> Option<Self> {
        lookup().get(function).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Group1 => "Group1",
            Self::Group2 => "Group2",
            Self::Group3 => "Group3",
            Self::Group4 => "Group4",
            Self::Group5 => "Group5",
        }
    }

    /// Parse a persisted group name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }

    /// Function ids in this group.
    pub fn functions(self) -> &'static [&'static str] {
        for (group, functions) in MEMBERS {
            if group == self {
                return functions;
            }
        }
        &[]
    }
}

impl fmt::Display for FunctionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// The learning cycles that have calendar-driven recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningCycle {
    Daf,
    WeeklyDaf,
    Mishnah,
    Parsha,
    Nach,
    Yerushalmi,
}

/// Calendar columns holding a cycle's position for the day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionColumns {
    Single(&'static str),
    Pair(&'static str, &'static str),
}

impl PositionColumns {
    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            PositionColumns::Single(a) => vec![*a],
            PositionColumns::Pair(a, b) => vec![*a, *b],
        }
    }
}

/// Which calendar and category columns describe a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDefinition {
    /// A cycle published as a numbered series (daf, perek/mishnah, chapter)
    Numbered {
        series_name: &'static str,
        category_column: &'static str,
        subcategory_column: &'static str,
        positions: PositionColumns,
    },
    /// Weekly parsha: matched on category flags alone
    Parsha {
        category_column: &'static str,
        subcategory_column: &'static str,
    },
}

impl CycleDefinition {
    pub fn category_column(&self) -> &'static str {
        match self {
            CycleDefinition::Numbered {
                category_column, ..
            }
            | CycleDefinition::Parsha {
                category_column, ..
            } => category_column,
        }
    }

    pub fn subcategory_column(&self) -> &'static str {
        match self {
            CycleDefinition::Numbered {
                subcategory_column,
                ..
            }
            | CycleDefinition::Parsha {
                subcategory_column,
                ..
            } => subcategory_column,
        }
    }
}

impl LearningCycle {
    pub const ALL: [LearningCycle; 6] = [
        LearningCycle::Daf,
        LearningCycle::WeeklyDaf,
        LearningCycle::Mishnah,
        LearningCycle::Parsha,
        LearningCycle::Nach,
        LearningCycle::Yerushalmi,
    ];

    /// Static column mapping for the cycle
    pub fn definition(&self) -> CycleDefinition {
        match self {
            LearningCycle::Daf => CycleDefinition::Numbered {
                series_name: "Daf Yomi",
                category_column: "category_Gemara",
                subcategory_column: "d_masechta",
                positions: PositionColumns::Single("d_num"),
            },
            LearningCycle::WeeklyDaf => CycleDefinition::Numbered {
                series_name: "Daf Hashvua",
                category_column: "category_Gemara",
                subcategory_column: "dw_masechta",
                positions: PositionColumns::Single("dw_num"),
            },
            LearningCycle::Mishnah => CycleDefinition::Numbered {
                series_name: "Mishna Yomi LZN Daniel Ari ben Avraham Kadesh",
                category_column: "category_Mishna",
                subcategory_column: "m_masechta",
                positions: PositionColumns::Pair("m_num1", "m_num2"),
            },
            LearningCycle::Parsha => CycleDefinition::Parsha {
                category_column: "category_Parsha",
                subcategory_column: "parashat",
            },
            LearningCycle::Nach => CycleDefinition::Numbered {
                series_name: "Nach Yomi",
                category_column: "category_Nach",
                subcategory_column: "n_sefer",
                positions: PositionColumns::Single("n_num"),
            },
            LearningCycle::Yerushalmi => CycleDefinition::Numbered {
                series_name: "Yerushalmi Yomi",
                category_column: "category_Yerushalmi",
                subcategory_column: "y_masechta",
                positions: PositionColumns::Single("y_num"),
            },
        }
    }

    /// Parses a selector such as `DAF`, `weekly_daf` or `weekly-daf`.
    ///
    /// Returns `None` for anything outside the fixed set.
    pub fn parse_selector(selector: &str) -> Option<Self> {
        let normalized = selector.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|cycle| cycle.selector() == normalized)
    }

    pub fn selector(&self) -> &'static str {
        match self {
            LearningCycle::Daf => "DAF",
            LearningCycle::WeeklyDaf => "WEEKLY_DAF",
            LearningCycle::Mishnah => "MISHNAH",
            LearningCycle::Parsha => "PARSHA",
            LearningCycle::Nach => "NACH",
            LearningCycle::Yerushalmi => "YERUSHALMI",
        }
    }
}

impl Display for LearningCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.selector())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown learning cycle selector: {0}")]
pub struct UnknownSelector(pub String);

impl FromStr for LearningCycle {
    type Err = UnknownSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_selector(s).ok_or_else(|| UnknownSelector(s.to_string()))
    }
}

//! Split rows into lipid classes by the suffix of their compound ID.
//!
//! An ID belongs to a class when it ends with the class name preceded by
//! an underscore or a space, e.g. `PC 34:1_PC` or `PE(P-16:0) plasmalogen`.
//! Matching is case-sensitive and a single trailing newline is allowed
//! after the suffix. IDs that are missing or not text belong to no class.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TransformResult;
use crate::models::{columns::COMPOUND_ID, Stage, Table};
use crate::validation::require_column;

static PC_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_ ]PC\n?$").expect("valid regex"));
static LPC_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_ ]LPC\n?$").expect("valid regex"));
static PLASMALOGEN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[_ ]plasmalogen\n?$").expect("valid regex"));

/// Lipid class recognised from a compound-ID suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Pc,
    Lpc,
    Plasmalogen,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Pc, Category::Lpc, Category::Plasmalogen];

    /// Whether `compound_id` carries this class's suffix.
    pub fn matches(&self, compound_id: &str) -> bool {
        let pattern = match self {
            Category::Pc => &PC_SUFFIX,
            Category::Lpc => &LPC_SUFFIX,
            Category::Plasmalogen => &PLASMALOGEN_SUFFIX,
        };
        pattern.is_match(compound_id)
    }

    /// Stage whose prefix marks this class's output file.
    pub fn stage(&self) -> Stage {
        match self {
            Category::Pc => Stage::Pc,
            Category::Lpc => Stage::Lpc,
            Category::Plasmalogen => Stage::Plasmalogen,
        }
    }
}

/// Rows of the source table, one subset per class.
///
/// Each subset keeps every source column and the source row order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySplit {
    pub pc: Table,
    pub lpc: Table,
    pub plasmalogen: Table,
}

impl CategorySplit {
    pub fn get(&self, category: Category) -> &Table {
        match category {
            Category::Pc => &self.pc,
            Category::Lpc => &self.lpc,
            Category::Plasmalogen => &self.plasmalogen,
        }
    }
}

/// Split `table` by the `Accepted Compound ID` suffix.
///
/// Rows matching no class are dropped from every subset.
pub fn split_categories(table: &Table) -> TransformResult<CategorySplit> {
    require_column(table, COMPOUND_ID)?;
    let ids = table.column(COMPOUND_ID).unwrap_or_default();

    let rows_for = |category: Category| -> Vec<usize> {
        ids.iter()
            .enumerate()
            .filter(|(_, cell)| cell.as_str().is_some_and(|id| category.matches(id)))
            .map(|(i, _)| i)
            .collect()
    };

    Ok(CategorySplit {
        pc: table.select_rows(&rows_for(Category::Pc)),
        lpc: table.select_rows(&rows_for(Category::Lpc)),
        plasmalogen: table.select_rows(&rows_for(Category::Plasmalogen)),
    })
}

//! Result formatting.
//!
//! Turns repaired genotypes into named, unit-aware menus with achieved
//! totals and their deviation from the target.

use std::fmt;

use crate::catalog::UnitKind;
use crate::search::{PfcTriple, SearchProblem};

/// One line of a recommended menu.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MenuEntry {
    pub item_name: String,
    /// Display quantity: a whole number for discrete units, otherwise
    /// rounded to two decimals.
    pub quantity: f64,
    pub unit: String,
    pub upper_bound: f64,
}

/// One recommended menu and how close it gets to the target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Recommendation {
    /// Items with a strictly positive quantity, in request order.
    pub menu: Vec<MenuEntry>,
    pub achieved: PfcTriple,
    /// Signed `achieved - target` per nutrient.
    pub delta: PfcTriple,
    /// `|delta.protein| + |delta.fat| + |delta.carbs|`.
    pub total_absolute_delta: f64,
}

/// Final output of a search: distinct recommendations, best first.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    pub recommendations: Vec<Recommendation>,
}

impl SearchResult {
    pub fn best(&self) -> Option<&Recommendation> {
        self.recommendations.first()
    }
}

/// Renders a bound-repaired genotype.
///
/// Totals are computed from the repaired quantities, not the rounded
/// display quantities.
pub fn render(problem: &SearchProblem, repaired: &[f64]) -> Recommendation {
    let menu = repaired
        .iter()
        .enumerate()
        .filter(|&(_, &q)| q > 0.0)
        .map(|(i, &q)| {
            let profile = &problem.profiles()[i];
            let quantity = match profile.kind {
                UnitKind::Discrete => q.trunc(),
                UnitKind::Continuous => round2(q),
            };
            MenuEntry {
                item_name: problem.items()[i].clone(),
                quantity,
                unit: profile.unit.clone(),
                upper_bound: problem.upper_bounds()[i],
            }
        })
        .collect();

    let achieved = problem.totals(repaired);
    let delta = achieved.delta(&problem.target());
    Recommendation {
        menu,
        achieved,
        delta,
        total_absolute_delta: delta.abs_sum(),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.menu {
            writeln!(
                f,
                "  {:<24} {:>10} {} (max {})",
                entry.item_name, entry.quantity, entry.unit, entry.upper_bound
            )?;
        }
        writeln!(
            f,
            "  protein {:.2} ({:+.2})  fat {:.2} ({:+.2})  carbs {:.2} ({:+.2})",
            self.achieved.protein,
            self.delta.protein,
            self.achieved.fat,
            self.delta.fat,
            self.achieved.carbs,
            self.delta.carbs,
        )?;
        write!(f, "  total deviation {:.2}", self.total_absolute_delta)
    }
}

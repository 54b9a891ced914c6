// Weighted field checklists opened by elevated risk levels
use serde::{Deserialize, Serialize};

use super::error::EvaluationError;
use super::risk::RiskLevel;

pub const ITEMS_PER_CATEGORY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistCategory {
    Electrical,
    Thermal,
    Sensitivity,
}

impl ChecklistCategory {
    pub fn title(self) -> &'static str {
        match self {
            ChecklistCategory::Electrical => "Electrical stress",
            ChecklistCategory::Thermal => "Thermal stress",
            ChecklistCategory::Sensitivity => "Heating sensitivity",
        }
    }

    pub fn items(self) -> &'static [ChecklistItem; ITEMS_PER_CATEGORY] {
        match self {
            ChecklistCategory::Electrical => &ELECTRICAL_ITEMS,
            ChecklistCategory::Thermal => &THERMAL_ITEMS,
            ChecklistCategory::Sensitivity => &SENSITIVITY_ITEMS,
        }
    }

    fn slot(self) -> usize {
        match self {
            ChecklistCategory::Electrical => 0,
            ChecklistCategory::Thermal => 1,
            ChecklistCategory::Sensitivity => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub category: ChecklistCategory,
    pub weight: u8,
    pub question: &'static str,
}

const fn item(category: ChecklistCategory, weight: u8, question: &'static str) -> ChecklistItem {
    ChecklistItem {
        category,
        weight,
        question,
    }
}

static ELECTRICAL_ITEMS: [ChecklistItem; ITEMS_PER_CATEGORY] = [
    item(ChecklistCategory::Electrical, 2, "Are there operating periods above rated current?"),
    item(ChecklistCategory::Electrical, 3, "Are load swings large, or does inrush current recur?"),
    item(ChecklistCategory::Electrical, 2, "Does the agitator run with foreign matter caught in it?"),
    item(ChecklistCategory::Electrical, 1, "Is the motor started without an inverter (DOL / Y-Δ)?"),
    item(ChecklistCategory::Electrical, 2, "Is a motor with service factor 1.0 or less run for long periods?"),
];

static THERMAL_ITEMS: [ChecklistItem; ITEMS_PER_CATEGORY] = [
    item(ChecklistCategory::Thermal, 3, "Have wiring terminals approached 70 ℃?"),
    item(ChecklistCategory::Thermal, 2, "Does the ambient temperature around the wiring exceed 40 ℃?"),
    item(ChecklistCategory::Thermal, 1, "Is the site poorly ventilated or short of heat dissipation?"),
    item(ChecklistCategory::Thermal, 2, "Is a heat source (electric or steam) adjacent to the wiring?"),
    item(ChecklistCategory::Thermal, 2, "Does a single run last several days continuously?"),
];

static SENSITIVITY_ITEMS: [ChecklistItem; ITEMS_PER_CATEGORY] = [
    item(ChecklistCategory::Sensitivity, 1, "Does temperature rise faster than before under the same conditions?"),
    item(ChecklistCategory::Sensitivity, 3, "Does temperature jump even when the current change is small?"),
    item(ChecklistCategory::Sensitivity, 3, "Does temperature climb non-linearly as load increases?"),
    item(ChecklistCategory::Sensitivity, 2, "Is the temperature rise larger than on comparable equipment?"),
    item(ChecklistCategory::Sensitivity, 1, "Does heat linger after the equipment cools down?"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistTier {
    Unevaluated,
    Caution,
    Warning,
    Critical,
}

impl ChecklistTier {
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => ChecklistTier::Unevaluated,
            1..=2 => ChecklistTier::Caution,
            3..=4 => ChecklistTier::Warning,
            _ => ChecklistTier::Critical,
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            ChecklistTier::Unevaluated => "Select checklist items to see the recommended action.",
            ChecklistTier::Caution => "Shorten the inspection interval and keep watching the trend.",
            ChecklistTier::Warning => {
                "Trend-monitor the insulation resistance pattern; expert review recommended."
            }
            ChecklistTier::Critical => {
                "Stop operation immediately; precision inspection is mandatory before restart."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category: ChecklistCategory,
    pub total_weight: u32,
    pub tier: ChecklistTier,
    /// Recommended action for the tier
    pub action: &'static str,
}

impl CategoryScore {
    pub fn from_weight(category: ChecklistCategory, total_weight: u32) -> Self {
        let tier = ChecklistTier::from_score(total_weight);
        Self {
            category,
            total_weight,
            tier,
            action: tier.action(),
        }
    }
}

/// Categories whose checklist applies, in display order.
pub fn active_categories(
    electrical: RiskLevel,
    thermal: RiskLevel,
    sensitivity: RiskLevel,
) -> Vec<ChecklistCategory> {
    [
        (ChecklistCategory::Electrical, electrical),
        (ChecklistCategory::Thermal, thermal),
        (ChecklistCategory::Sensitivity, sensitivity),
    ]
    .into_iter()
    .filter(|(_, level)| level.is_elevated())
    .map(|(category, _)| category)
    .collect()
}

/// Checked state of one checklist instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistSheet {
    active: Vec<ChecklistCategory>,
    checked: [[bool; ITEMS_PER_CATEGORY]; 3],
}

impl ChecklistSheet {
    pub fn new(active: Vec<ChecklistCategory>) -> Self {
        Self {
            active,
            checked: [[false; ITEMS_PER_CATEGORY]; 3],
        }
    }

    pub fn for_risks(electrical: RiskLevel, thermal: RiskLevel, sensitivity: RiskLevel) -> Self {
        Self::new(active_categories(electrical, thermal, sensitivity))
    }

    pub fn active(&self) -> &[ChecklistCategory] {
        &self.active
    }

    /// Nothing is elevated, so no checklist is shown.
    pub fn all_normal(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_checked(&self, category: ChecklistCategory, index: usize) -> bool {
        self.checked[category.slot()]
            .get(index)
            .copied()
            .unwrap_or(false)
    }

    pub fn set(
        &mut self,
        category: ChecklistCategory,
        index: usize,
        checked: bool,
    ) -> Result<CategoryScore, EvaluationError> {
        if !self.active.contains(&category) {
            return Err(EvaluationError::invalid(format!(
                "{} checklist is not active",
                category.title()
            )));
        }
        let slot = self.checked[category.slot()]
            .get_mut(index)
            .ok_or_else(|| EvaluationError::invalid(format!("checklist item {index} does not exist")))?;
        *slot = checked;
        Ok(self.score(category))
    }

    pub fn score(&self, category: ChecklistCategory) -> CategoryScore {
        let total = category
            .items()
            .iter()
            .zip(self.checked[category.slot()])
            .filter(|(_, checked)| *checked)
            .map(|(item, _)| u32::from(item.weight))
            .sum();
        CategoryScore::from_weight(category, total)
    }

    /// Scores of the active categories.
    pub fn scores(&self) -> Vec<CategoryScore> {
        self.active.iter().map(|category| self.score(*category)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category_adds_up_to_ten() {
        for category in [
            ChecklistCategory::Electrical,
            ChecklistCategory::Thermal,
            ChecklistCategory::Sensitivity,
        ] {
            let total: u32 = category.items().iter().map(|i| u32::from(i.weight)).sum();
            assert_eq!(total, 10, "{category:?}");
            assert!(category.items().iter().all(|i| i.category == category));
            assert!(category.items().iter().all(|i| (1..=3).contains(&i.weight)));
        }
    }

    #[test]
    fn test_tier_mapping() {
        assert_eq!(ChecklistTier::from_score(0), ChecklistTier::Unevaluated);
        assert_eq!(ChecklistTier::from_score(1), ChecklistTier::Caution);
        assert_eq!(ChecklistTier::from_score(2), ChecklistTier::Caution);
        assert_eq!(ChecklistTier::from_score(3), ChecklistTier::Warning);
        assert_eq!(ChecklistTier::from_score(4), ChecklistTier::Warning);
        assert_eq!(ChecklistTier::from_score(5), ChecklistTier::Critical);
        assert_eq!(ChecklistTier::from_score(10), ChecklistTier::Critical);
    }

    #[test]
    fn test_only_elevated_categories_are_active() {
        let active = active_categories(RiskLevel::L1, RiskLevel::L3, RiskLevel::Baseline);
        assert_eq!(active, vec![ChecklistCategory::Thermal]);

        let sheet = ChecklistSheet::for_risks(RiskLevel::L1, RiskLevel::L1, RiskLevel::Baseline);
        assert!(sheet.all_normal());
        assert!(sheet.scores().is_empty());
    }

    #[test]
    fn test_unchecked_category_is_unevaluated() {
        let sheet = ChecklistSheet::for_risks(RiskLevel::L2, RiskLevel::L2, RiskLevel::L2);
        for score in sheet.scores() {
            assert_eq!(score.total_weight, 0);
            assert_eq!(score.tier, ChecklistTier::Unevaluated);
        }
    }

    #[test]
    fn test_toggling_items_rescoring() {
        let mut sheet = ChecklistSheet::for_risks(RiskLevel::L4, RiskLevel::L1, RiskLevel::L2);

        let score = sheet.set(ChecklistCategory::Electrical, 1, true).unwrap();
        assert_eq!(score.total_weight, 3);
        assert_eq!(score.tier, ChecklistTier::Warning);

        let score = sheet.set(ChecklistCategory::Electrical, 0, true).unwrap();
        assert_eq!(score.total_weight, 5);
        assert_eq!(score.tier, ChecklistTier::Critical);

        let score = sheet.set(ChecklistCategory::Electrical, 1, false).unwrap();
        assert_eq!(score.total_weight, 2);
        assert_eq!(score.tier, ChecklistTier::Caution);

        assert_eq!(sheet.score(ChecklistCategory::Sensitivity).total_weight, 0);
        assert!(sheet.is_checked(ChecklistCategory::Electrical, 0));
    }

    #[test]
    fn test_rejects_inactive_category_and_bad_index() {
        let mut sheet = ChecklistSheet::for_risks(RiskLevel::L2, RiskLevel::L1, RiskLevel::L1);
        assert!(sheet.set(ChecklistCategory::Thermal, 0, true).is_err());
        assert!(sheet.set(ChecklistCategory::Electrical, 5, true).is_err());
    }
}

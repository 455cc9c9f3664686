//! Estimate totals: subtotal, category labor, sales tax and grand total.
//!
//! All amounts are integer cents. Totals are derived on every read from the
//! current line items and product prices and are never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::model::PricedItem;

/// Flat fee added to every estimate's labor.
pub const DEFAULT_BASE_LABOR_CENTS: i64 = 30_000;

/// Sales tax is `subtotal / divisor`, truncated toward zero.
pub const DEFAULT_TAX_DIVISOR: i64 = 6;

/// How a product category contributes to labor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaborRule {
    /// Fixed fee per line, regardless of quantity.
    PerLine { cents: i64 },
    /// Fee multiplied by the line quantity.
    PerUnit { cents: i64 },
}

impl LaborRule {
    pub fn labor_for(&self, quantity: i64) -> i64 {
        match *self {
            LaborRule::PerLine { cents } => cents,
            LaborRule::PerUnit { cents } => cents.saturating_mul(quantity),
        }
    }

    fn cents(&self) -> i64 {
        match *self {
            LaborRule::PerLine { cents } | LaborRule::PerUnit { cents } => cents,
        }
    }
}

/// The default category labor table.
pub fn default_labor_rules() -> BTreeMap<String, LaborRule> {
    [
        ("Appliances", LaborRule::PerLine { cents: 10_000 }),
        ("Cabinetry", LaborRule::PerUnit { cents: 2_500 }),
        ("Countertops", LaborRule::PerUnit { cents: 3_000 }),
        ("Flooring", LaborRule::PerUnit { cents: 500 }),
        ("Sinks & Faucets", LaborRule::PerUnit { cents: 7_500 }),
    ]
    .into_iter()
    .map(|(category, rule)| (category.to_string(), rule))
    .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EstimateTotals {
    pub subtotal: i64,
    pub labor: i64,
    pub sales_tax: i64,
    pub total: i64,
}

/// Pricing parameters: base labor fee, tax divisor and the category table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    base_labor_cents: i64,
    tax_divisor: i64,
    labor_rules: BTreeMap<String, LaborRule>,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            base_labor_cents: DEFAULT_BASE_LABOR_CENTS,
            tax_divisor: DEFAULT_TAX_DIVISOR,
            labor_rules: default_labor_rules(),
        }
    }
}

impl PricingPolicy {
    pub fn new(
        base_labor_cents: i64,
        tax_divisor: i64,
        labor_rules: BTreeMap<String, LaborRule>,
    ) -> Result<Self, ConfigError> {
        if base_labor_cents < 0 {
            return Err(ConfigError::Validation {
                message: format!("base labor must not be negative, got {}", base_labor_cents),
            });
        }
        if tax_divisor <= 0 {
            return Err(ConfigError::Validation {
                message: format!("tax divisor must be positive, got {}", tax_divisor),
            });
        }
        for (category, rule) in &labor_rules {
            if rule.cents() < 0 {
                return Err(ConfigError::InvalidLaborRule {
                    category: category.clone(),
                    reason: "fee must not be negative".to_string(),
                });
            }
        }

        Ok(Self {
            base_labor_cents,
            tax_divisor,
            labor_rules,
        })
    }

    pub fn base_labor_cents(&self) -> i64 {
        self.base_labor_cents
    }

    pub fn tax_divisor(&self) -> i64 {
        self.tax_divisor
    }

    /// Labor rule for a category; categories outside the table have none.
    pub fn labor_rule(&self, category: &str) -> Option<&LaborRule> {
        self.labor_rules.get(category)
    }

    /// Computes totals for the given line items.
    pub fn totals(&self, items: &[PricedItem]) -> EstimateTotals {
        let mut subtotal = 0i64;
        let mut labor = self.base_labor_cents;

        for item in items {
            subtotal = subtotal
                .saturating_add(item.product.unit_price_cents.saturating_mul(item.quantity));
            if let Some(rule) = self.labor_rule(&item.product.category) {
                labor = labor.saturating_add(rule.labor_for(item.quantity));
            }
        }

        let sales_tax = subtotal / self.tax_divisor;

        EstimateTotals {
            subtotal,
            labor,
            sales_tax,
            total: subtotal.saturating_add(labor).saturating_add(sales_tax),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::model::Product;

    fn item(category: &str, unit_price_cents: i64, quantity: i64) -> PricedItem {
        PricedItem {
            line_item_id: 1,
            product: Product {
                id: 1,
                name: format!("{} item", category),
                description: String::new(),
                category: category.to_string(),
                subcategory: String::new(),
                color: String::new(),
                unit_price_cents,
                length_inch: 10.0,
                width_inch: 10.0,
                height_inch: 10.0,
                created_by: None,
            },
            quantity,
        }
    }

    #[test]
    fn test_single_countertop_line() {
        let totals = PricingPolicy::default().totals(&[item("Countertops", 10_000, 2)]);
        assert_eq!(totals.subtotal, 20_000);
        assert_eq!(totals.labor, 36_000);
        assert_eq!(totals.sales_tax, 3_333);
        assert_eq!(totals.total, 59_333);
    }

    #[test]
    fn test_appliances_are_flat_per_line() {
        let totals = PricingPolicy::default().totals(&[
            item("Appliances", 50_000, 3),
            item("Appliances", 20_000, 1),
        ]);
        assert_eq!(totals.subtotal, 170_000);
        assert_eq!(totals.labor, 30_000 + 10_000 + 10_000);
    }

    #[test]
    fn test_unknown_category_contributes_no_labor() {
        let totals = PricingPolicy::default().totals(&[item("Lighting", 4_000, 5)]);
        assert_eq!(totals.labor, DEFAULT_BASE_LABOR_CENTS);
        assert_eq!(totals.subtotal, 20_000);
    }

    #[test]
    fn test_mixed_categories() {
        let totals = PricingPolicy::default().totals(&[
            item("Cabinetry", 12_000, 4),
            item("Flooring", 300, 100),
            item("Sinks & Faucets", 25_000, 1),
        ]);
        assert_eq!(totals.subtotal, 48_000 + 30_000 + 25_000);
        assert_eq!(totals.labor, 30_000 + 10_000 + 50_000 + 7_500);
        assert_eq!(totals.sales_tax, 103_000 / 6);
    }

    #[test]
    fn test_total_is_sum_of_parts_and_deterministic() {
        let policy = PricingPolicy::default();
        let items = [
            item("Countertops", 9_999, 3),
            item("Appliances", 1, 1),
            item("Misc", 7, 13),
        ];
        let first = policy.totals(&items);
        let second = policy.totals(&items);
        assert_eq!(first, second);
        assert_eq!(first.total, first.subtotal + first.labor + first.sales_tax);
    }

    #[test]
    fn test_tax_truncates_toward_zero() {
        let totals = PricingPolicy::default().totals(&[item("Misc", 5, 1)]);
        assert_eq!(totals.sales_tax, 0);
    }

    #[test]
    fn test_custom_policy() {
        let mut rules = BTreeMap::new();
        rules.insert("Islands".to_string(), LaborRule::PerUnit { cents: 1_000 });
        let policy = PricingPolicy::new(0, 10, rules).unwrap();
        let totals = policy.totals(&[item("Islands", 100_000, 2)]);
        assert_eq!(totals.labor, 2_000);
        assert_eq!(totals.sales_tax, 20_000);
    }

    #[test]
    fn test_policy_rejects_bad_parameters() {
        assert!(PricingPolicy::new(0, 0, BTreeMap::new()).is_err());
        assert!(PricingPolicy::new(-1, 6, BTreeMap::new()).is_err());

        let mut rules = BTreeMap::new();
        rules.insert("Bad".to_string(), LaborRule::PerLine { cents: -5 });
        assert!(matches!(
            PricingPolicy::new(0, 6, rules),
            Err(ConfigError::InvalidLaborRule { .. })
        ));
    }

    #[test]
    fn test_extreme_amounts_saturate() {
        let policy = PricingPolicy::default();
        let totals = policy.totals(&[item("Countertops", i64::MAX / 2, 3)]);
        assert_eq!(totals.subtotal, i64::MAX);
        assert_eq!(totals.total, i64::MAX);
        assert_eq!(
            LaborRule::PerUnit { cents: 3_000 }.labor_for(i64::MAX),
            i64::MAX
        );
    }

    #[test]
    fn test_labor_rule_serde_shape() {
        let rule: LaborRule = serde_json::from_str(r#"{"kind": "per_unit", "cents": 250}"#).unwrap();
        assert_eq!(rule, LaborRule::PerUnit { cents: 250 });
        assert_eq!(rule.labor_for(4), 1_000);
    }
}

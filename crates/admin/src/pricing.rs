//! Pricing calculator for the back office.
//!
//! Pure arithmetic over a cost breakdown: either apply a markup
//! multiplier to suggest a sale price, or start from a target price and
//! derive the implied markup. Jewelry houses traditionally price at
//! several times cost, hence the 2.5 default.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Default markup multiplier.
const DEFAULT_MARKUP: Decimal = Decimal::from_parts(25, 0, 0, false, 1);

/// One cost row, in pesos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostItem {
    pub id: String,
    pub label: String,
    pub value: i64,
}

/// Calculator mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingMode {
    /// Suggest a price from cost x markup.
    #[default]
    Markup,
    /// Analyze a given target price.
    Target,
}

/// Derived figures for the current inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingSummary {
    pub total_cost: i64,
    pub suggested_price: i64,
    pub gross_profit: i64,
    pub margin_percent: Decimal,
    pub roi_percent: Decimal,
    /// Only meaningful in target mode with a nonzero cost.
    pub implied_markup: Option<Decimal>,
}

/// The pricing calculator state.
#[derive(Debug, Clone)]
pub struct PricingCalculator {
    cost_items: Vec<CostItem>,
    custom_costs: Vec<CostItem>,
    next_custom_id: u32,
    markup_multiplier: Decimal,
    target_price: Option<i64>,
    mode: PricingMode,
}

impl PricingCalculator {
    /// Fresh calculator with the standard jewelry cost rows zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cost_items: standard_costs(),
            custom_costs: Vec::new(),
            next_custom_id: 0,
            markup_multiplier: DEFAULT_MARKUP,
            target_price: None,
            mode: PricingMode::Markup,
        }
    }

    /// All cost rows, standard first.
    #[must_use]
    pub fn costs(&self) -> Vec<&CostItem> {
        self.cost_items.iter().chain(&self.custom_costs).collect()
    }

    /// Set the value of a cost row by id. Unknown ids are ignored.
    pub fn set_cost(&mut self, id: &str, value: i64) {
        let item = self
            .cost_items
            .iter_mut()
            .chain(&mut self.custom_costs)
            .find(|item| item.id == id);
        if let Some(item) = item {
            item.value = value.max(0);
        }
    }

    /// Append a custom cost row and return its id.
    pub fn add_custom_cost(&mut self, label: impl Into<String>) -> String {
        self.next_custom_id += 1;
        let id = format!("custom-{}", self.next_custom_id);
        self.custom_costs.push(CostItem {
            id: id.clone(),
            label: label.into(),
            value: 0,
        });
        id
    }

    /// Rename a custom cost row. Unknown ids are ignored.
    pub fn rename_custom_cost(&mut self, id: &str, label: impl Into<String>) {
        if let Some(item) = self.custom_costs.iter_mut().find(|item| item.id == id) {
            item.label = label.into();
        }
    }

    /// Remove a custom cost row. Unknown ids are ignored.
    pub fn remove_custom_cost(&mut self, id: &str) {
        self.custom_costs.retain(|item| item.id != id);
    }

    pub fn set_markup(&mut self, multiplier: Decimal) {
        if multiplier > Decimal::ZERO {
            self.markup_multiplier = multiplier;
        }
    }

    pub fn set_target_price(&mut self, price: Option<i64>) {
        self.target_price = price.map(|p| p.max(0));
    }

    pub fn set_mode(&mut self, mode: PricingMode) {
        self.mode = mode;
    }

    #[must_use]
    pub const fn mode(&self) -> PricingMode {
        self.mode
    }

    /// Derived totals for the current inputs.
    #[must_use]
    pub fn summary(&self) -> PricingSummary {
        let total_cost: i64 = self
            .cost_items
            .iter()
            .chain(&self.custom_costs)
            .map(|item| item.value)
            .sum();
        let cost = Decimal::from(total_cost);

        let (price, implied_markup) = match self.mode {
            PricingMode::Markup => {
                let suggested = (cost * self.markup_multiplier)
                    .round()
                    .to_i64()
                    .unwrap_or(0);
                (suggested, None)
            }
            PricingMode::Target => {
                let target = self.target_price.unwrap_or(0);
                let implied = if total_cost > 0 {
                    Some(Decimal::from(target) / cost)
                } else {
                    None
                };
                (target, implied)
            }
        };

        let profit = price - total_cost;
        let margin_percent = if price > 0 {
            Decimal::from(profit) / Decimal::from(price) * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        let roi_percent = if total_cost > 0 {
            Decimal::from(profit) / cost * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        PricingSummary {
            total_cost,
            suggested_price: price,
            gross_profit: profit,
            margin_percent,
            roi_percent,
            implied_markup,
        }
    }

    /// Zero every input and restore the defaults.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for PricingCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn standard_costs() -> Vec<CostItem> {
    [
        ("material", "Material Principal (Oro/Plata)"),
        ("gems", "Piedras / Gemas"),
        ("labor", "Mano de Obra"),
        ("packaging", "Empaque y Presentación"),
        ("shipping", "Envío / Logística"),
    ]
    .into_iter()
    .map(|(id, label)| CostItem {
        id: id.to_owned(),
        label: label.to_owned(),
        value: 0,
    })
    .collect()
}

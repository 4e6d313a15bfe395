use rust_decimal::Decimal;

use crate::format::round2;

/// Market value grouped by fund category, in first-seen order.
///
/// Category totals are presentation-only. The valuation loop adds each
/// holding's market value rounded to two decimals before accumulation,
/// so a category total is the sum of the figures a user sees per
/// holding, not a rounded sum of exact values. That trade-off is
/// deliberate and pinned by tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationBuckets {
    entries: Vec<(String, Decimal)>,
}

/// One category slice of the allocation roll-up.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSlice {
    pub category: String,
    pub value: Decimal,
}

impl AllocationBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a (pre-rounded) market value into a category bucket.
    pub fn add(&mut self, category: &str, value: Decimal) {
        // Linear scan: the category set is small and bounded by the
        // holdings page size.
        for (existing, total) in &mut self.entries {
            if existing == category {
                *total += value;
                return;
            }
        }
        self.entries.push((category.to_string(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// One entry per observed category, two-decimal values, first-seen
    /// order.
    pub fn rollup(&self) -> Vec<AllocationSlice> {
        self.entries
            .iter()
            .map(|(category, total)| AllocationSlice {
                category: category.clone(),
                value: round2(*total),
            })
            .collect()
    }
}

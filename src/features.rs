use serde::Deserialize;
use std::collections::HashMap;

use crate::{error::ScoreError, types::ScoreRequest};

pub const TOTAL_QTY: &str = "total_qty";
pub const SCHEDULE_MONTH: &str = "schedule_month";

const SUPPLIER_PREFIX: &str = "d_sup_";
const WAREHOUSE_PREFIX: &str = "d_wh_";
const ITEM_PREFIX: &str = "d_item_";

const DEFAULT_SUPPLIERS: [&str; 5] = [
    "Aromatico",
    "Beans Inc.",
    "Fair Trade AG",
    "Farmers of Brazil",
    "Handelskontor Hamburg",
];
const DEFAULT_WAREHOUSES: [&str; 7] = [
    "Naples - RR",
    "Amsterdam - RR",
    "London - RR",
    "Hamburg - RR",
    "Barcelona - RR",
    "Nairobi - RR",
    "Istanbul - RR",
];
const DEFAULT_ITEMS: [&str; 6] = [
    "Excelsa",
    "Maragogype",
    "Maragogype Type B",
    "Robusta",
    "Liberica",
    "Arabica",
];

/// Known values for each one-hot encoded field. Normally shipped inside the
/// model artifact; `Default` holds the lists the current model was trained on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategorySchema {
    pub supplier: Vec<String>,
    pub warehouse: Vec<String>,
    pub item_name: Vec<String>,
}

impl Default for CategorySchema {
    fn default() -> Self {
        let owned = |xs: &[&str]| -> Vec<String> { xs.iter().map(|s| s.to_string()).collect() };
        Self {
            supplier: owned(&DEFAULT_SUPPLIERS[..]),
            warehouse: owned(&DEFAULT_WAREHOUSES[..]),
            item_name: owned(&DEFAULT_ITEMS[..]),
        }
    }
}

impl CategorySchema {
    pub fn n_indicators(&self) -> usize {
        self.supplier.len() + self.warehouse.len() + self.item_name.len()
    }
}

/// One named row of model input.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    /// `total_qty`, `schedule_month`, then the supplier, warehouse and item
    /// indicator groups. An unknown value leaves its group all zero.
    pub fn build(req: &ScoreRequest, schema: &CategorySchema) -> Self {
        let width = 2 + schema.n_indicators();
        let mut row = Self {
            columns: Vec::with_capacity(width),
            values: Vec::with_capacity(width),
        };
        row.push(TOTAL_QTY.to_string(), req.quantity as f64);
        row.push(SCHEDULE_MONTH.to_string(), f64::from(req.schedule_month));
        row.one_hot(SUPPLIER_PREFIX, &schema.supplier, &req.supplier);
        row.one_hot(WAREHOUSE_PREFIX, &schema.warehouse, &req.warehouse);
        row.one_hot(ITEM_PREFIX, &schema.item_name, &req.item_name);
        row
    }

    fn push(&mut self, column: String, value: f64) {
        self.columns.push(column);
        self.values.push(value);
    }

    fn one_hot(&mut self, prefix: &str, known: &[String], value: &str) {
        for k in known {
            let bit = if k == value { 1.0 } else { 0.0 };
            self.push(format!("{prefix}{k}"), bit);
        }
    }

    /// Reorders to `expected`. Columns the model does not list are dropped;
    /// columns it lists that were never built are a schema mismatch.
    pub fn align(&self, expected: &[String]) -> Result<FeatureRow, ScoreError> {
        let index: HashMap<&str, usize> = self
            .columns
            .iter()
            .enumerate()
            .rev() // first occurrence wins
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let missing: Vec<String> = expected
            .iter()
            .filter(|c| !index.contains_key(c.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ScoreError::SchemaMismatch(missing));
        }

        let values = expected.iter().map(|c| self.values[index[c.as_str()]]).collect();
        Ok(FeatureRow {
            columns: expected.to_vec(),
            values,
        })
    }

    pub fn ensure_finite(&self) -> Result<(), ScoreError> {
        if self.values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(ScoreError::InvalidFeatureValues)
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
impl FeatureRow {
    fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(supplier: &str, warehouse: &str, item: &str) -> ScoreRequest {
        ScoreRequest {
            supplier: supplier.into(),
            quantity: 10,
            warehouse: warehouse.into(),
            item_name: item.into(),
            schedule_date: "2024-07-01".into(),
            schedule_month: 7,
        }
    }

    fn group_sum(row: &FeatureRow, prefix: &str) -> f64 {
        row.columns()
            .iter()
            .zip(row.values())
            .filter(|(c, _)| c.starts_with(prefix))
            .map(|(_, v)| *v)
            .sum()
    }

    #[test]
    fn test_default_layout() {
        let row = FeatureRow::build(&request("x", "y", "z"), &CategorySchema::default());
        assert_eq!(row.columns().len(), 20);
        assert_eq!(row.columns()[0], TOTAL_QTY);
        assert_eq!(row.columns()[1], SCHEDULE_MONTH);
        assert_eq!(row.columns()[2], "d_sup_Aromatico");
        assert_eq!(row.columns()[7], "d_wh_Naples - RR");
        assert_eq!(row.columns()[14], "d_item_Excelsa");
        assert_eq!(row.columns()[19], "d_item_Arabica");
    }

    #[test]
    fn test_known_values_set_one_indicator_per_group() {
        let row = FeatureRow::build(
            &request("Aromatico", "Naples - RR", "Excelsa"),
            &CategorySchema::default(),
        );
        assert_eq!(row.get(TOTAL_QTY), Some(10.0));
        assert_eq!(row.get(SCHEDULE_MONTH), Some(7.0));
        assert_eq!(row.get("d_sup_Aromatico"), Some(1.0));
        assert_eq!(row.get("d_wh_Naples - RR"), Some(1.0));
        assert_eq!(row.get("d_item_Excelsa"), Some(1.0));
        assert_eq!(group_sum(&row, SUPPLIER_PREFIX), 1.0);
        assert_eq!(group_sum(&row, WAREHOUSE_PREFIX), 1.0);
        assert_eq!(group_sum(&row, ITEM_PREFIX), 1.0);
        assert_eq!(row.get("d_item_Maragogype Type B"), Some(0.0));
    }

    #[test]
    fn test_unknown_value_zeroes_group() {
        let row = FeatureRow::build(
            &request("Unknown Co", "Hamburg - RR", "arabica"),
            &CategorySchema::default(),
        );
        assert_eq!(group_sum(&row, SUPPLIER_PREFIX), 0.0);
        assert_eq!(group_sum(&row, WAREHOUSE_PREFIX), 1.0);
        // matching is case-sensitive
        assert_eq!(group_sum(&row, ITEM_PREFIX), 0.0);
    }

    #[test]
    fn test_custom_schema() {
        let schema = CategorySchema {
            supplier: vec!["Acme".into()],
            warehouse: vec![],
            item_name: vec!["Decaf".into(), "Mocha".into()],
        };
        let row = FeatureRow::build(&request("Acme", "Naples - RR", "Mocha"), &schema);
        assert_eq!(
            row.columns(),
            &[TOTAL_QTY, SCHEDULE_MONTH, "d_sup_Acme", "d_item_Decaf", "d_item_Mocha"]
        );
        assert_eq!(row.values(), &[10.0, 7.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_align_reorders_and_drops() {
        let row = FeatureRow::build(
            &request("Aromatico", "Naples - RR", "Excelsa"),
            &CategorySchema::default(),
        );
        let expected: Vec<String> = ["d_item_Excelsa", SCHEDULE_MONTH, "d_sup_Beans Inc.", TOTAL_QTY]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let aligned = row.align(&expected).unwrap();
        assert_eq!(aligned.columns(), expected.as_slice());
        assert_eq!(aligned.values(), &[1.0, 7.0, 0.0, 10.0]);
    }

    #[test]
    fn test_align_reports_missing_columns() {
        let row = FeatureRow::build(&request("a", "b", "c"), &CategorySchema::default());
        let expected = vec![
            TOTAL_QTY.to_string(),
            "d_item_Kopi Luwak".to_string(),
            "d_sup_Nobody".to_string(),
        ];
        match row.align(&expected) {
            Err(ScoreError::SchemaMismatch(cols)) => {
                assert_eq!(cols, vec!["d_item_Kopi Luwak", "d_sup_Nobody"])
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_finite() {
        let ok = FeatureRow::build(&request("a", "b", "c"), &CategorySchema::default());
        assert!(ok.ensure_finite().is_ok());

        let mut bad = ok.clone();
        bad.values[0] = f64::INFINITY;
        assert!(matches!(bad.ensure_finite(), Err(ScoreError::InvalidFeatureValues)));

        let mut nan = ok;
        nan.values[1] = f64::NAN;
        assert!(matches!(nan.ensure_finite(), Err(ScoreError::InvalidFeatureValues)));
    }
}

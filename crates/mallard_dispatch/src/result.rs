//! Unified result representation across both execution paths.

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use mallard_engine::NativeResult;

/// Column schema plus ordered row batches, identical in shape no matter
/// which executor produced it.
#[derive(Debug, Clone)]
pub struct ResultSet {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    rows_affected: Option<u64>,
}

impl ResultSet {
    /// Adapts an engine-native result. Pure structural conversion: schema
    /// field order and row order are preserved verbatim, with no reordering
    /// and no deduplication.
    pub fn from_native(native: NativeResult) -> Self {
        Self {
            schema: native.schema,
            batches: native.batches,
            rows_affected: native.rows_affected,
        }
    }

    /// Ordered column schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Ordered row batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total rows across all batches.
    pub fn row_count(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Rows changed, when the statement was a mutation.
    pub fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Array, ArrayRef, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;

    #[test]
    fn adaptation_preserves_schema_and_row_order() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("b", DataType::Int64, false),
            Field::new("a", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![3, 1, 2])) as ArrayRef,
                Arc::new(Int64Array::from(vec![30, 10, 20])) as ArrayRef,
            ],
        )
        .expect("batch");
        let result = ResultSet::from_native(NativeResult::new(schema, vec![batch]));

        assert_eq!(result.column_names(), vec!["b", "a"]);
        assert_eq!(result.row_count(), 3);
        let column = result.batches()[0]
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("int column");
        assert_eq!(column.value(0), 3);
        assert_eq!(column.value(1), 1);
        assert_eq!(column.value(2), 2);
    }

    #[test]
    fn mutation_results_carry_affected_rows() {
        let result = ResultSet::from_native(NativeResult::mutation(5));
        assert_eq!(result.rows_affected(), Some(5));
        assert_eq!(result.row_count(), 0);
    }
}

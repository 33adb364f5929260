//! Tabular view of the evaluation history (`evaluations.csv`).

use csv::{ReaderBuilder, StringRecord, Writer};
use rb_types::{
    BridgeResult, CostOutcome, EvaluationRecord, ParameterValue, SerializationError,
    COST_COLUMN, INVALID_COLUMN, ITERATION_COLUMN, UTILITY_COLUMNS,
};
use std::path::Path;

/// One row per evaluation; parameter columns first, utility columns last.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationTable {
    parameter_names: Vec<String>,
    records: Vec<EvaluationRecord>,
}

impl EvaluationTable {
    pub fn new(parameter_names: Vec<String>, records: Vec<EvaluationRecord>) -> Self {
        Self {
            parameter_names,
            records,
        }
    }

    /// Parameter axes, i.e. every column that is not a utility column.
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> Vec<&str> {
        self.parameter_names
            .iter()
            .map(String::as_str)
            .chain(UTILITY_COLUMNS)
            .collect()
    }

    /// Best valid record, if any evaluation succeeded.
    pub fn best_valid(&self) -> Option<&EvaluationRecord> {
        self.records
            .iter()
            .filter(|r| !r.is_invalid())
            .min_by(|a, b| a.cost().total_cmp(&b.cost()))
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> BridgeResult<()> {
        let mut writer = Writer::from_path(path.as_ref())?;
        writer.write_record(self.columns())?;

        for record in &self.records {
            let mut row: Vec<String> = self
                .parameter_names
                .iter()
                .map(|name| {
                    record
                        .value_of(name)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                })
                .collect();
            row.push(record.iteration.to_string());
            row.push(record.cost().to_string());
            row.push(record.is_invalid().to_string());
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> BridgeResult<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

        let headers = reader.headers()?.clone();
        let parameter_names = Self::parameter_columns(&headers)?;
        let dimensions = parameter_names.len();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let values = parameter_names
                .iter()
                .enumerate()
                .map(|(i, name)| -> BridgeResult<ParameterValue> {
                    Ok(ParameterValue::new(name.clone(), parse_field(&row, i, name)?))
                })
                .collect::<BridgeResult<Vec<_>>>()?;

            let iteration = parse_field(&row, dimensions, ITERATION_COLUMN)?;
            let cost = parse_field(&row, dimensions + 1, COST_COLUMN)?;
            let invalid = parse_field(&row, dimensions + 2, INVALID_COLUMN)?;

            records.push(EvaluationRecord {
                iteration,
                values,
                outcome: CostOutcome::from_parts(cost, invalid),
            });
        }

        tracing::debug!("Read {} evaluations from {}", records.len(), path.display());

        Ok(Self {
            parameter_names,
            records,
        })
    }

    fn parameter_columns(headers: &StringRecord) -> BridgeResult<Vec<String>> {
        let columns: Vec<&str> = headers.iter().collect();
        let split = columns.len().checked_sub(UTILITY_COLUMNS.len());
        match split {
            Some(split) if columns[split..] == UTILITY_COLUMNS => {
                Ok(columns[..split].iter().map(|c| c.to_string()).collect())
            }
            _ => Err(SerializationError::schema(
                "evaluations table header",
                format!("expected trailing columns {UTILITY_COLUMNS:?}, got {columns:?}"),
            )
            .into()),
        }
    }
}

fn parse_field<T: std::str::FromStr>(
    row: &StringRecord,
    index: usize,
    column: &str,
) -> BridgeResult<T>
where
    T::Err: std::fmt::Display,
{
    let raw = row.get(index).ok_or_else(|| {
        SerializationError::schema("evaluations table row", format!("missing column {column}"))
    })?;
    raw.parse::<T>().map_err(|e| {
        SerializationError::schema(
            "evaluations table row",
            format!("column {column}: cannot parse '{raw}': {e}"),
        )
        .into()
    })
}

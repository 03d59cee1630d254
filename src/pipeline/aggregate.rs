//! Group-by partitioning and per-partition aggregation.

use super::Stage;
use super::spec::{AggregateFunction, AggregationRule, GroupSpec};
use crate::error::{Result, SiftError};
use crate::table::{CellValue, Column, SemanticType, Table};
use std::collections::{HashMap, HashSet};

/// Output name for an aggregated column, before collision handling.
pub fn aggregate_column_name(column: &str, function: AggregateFunction) -> String {
    format!("{column}_{function}")
}

/// Returns `base`, or `base_1`, `base_2`, ... when taken, and records the result.
pub fn unique_column_name(base: String, taken: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut count = 0;
    while taken.contains(&candidate) {
        count += 1;
        candidate = format!("{base}_{count}");
    }
    taken.insert(candidate.clone());
    candidate
}

/// Rows sharing one key tuple, in first-appearance order.
#[derive(Debug)]
struct Partition {
    rows: Vec<usize>,
}

/// Partitions `table` by `grouping.columns` and applies every rule per partition.
///
/// The output holds the key columns followed by one column per rule. Rows whose key
/// contains a null are left out.
///
/// # Errors
///
/// Returns [`SiftError::Execution`] for a missing column, a sum/mean/std over text,
/// or an integer sum that overflows.
pub fn group_and_aggregate(
    table: &Table,
    grouping: &GroupSpec,
    aggregations: &[AggregationRule],
) -> Result<Table> {
    let key_columns = grouping
        .columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .ok_or_else(|| SiftError::missing_column(Stage::Aggregate, name))
        })
        .collect::<Result<Vec<_>>>()?;

    let partitions = partition(table.row_count(), &key_columns);
    let first_rows: Vec<usize> = partitions
        .iter()
        .filter_map(|p| p.rows.first().copied())
        .collect();

    let mut taken: HashSet<String> = key_columns.iter().map(|c| c.name().to_owned()).collect();
    let mut columns: Vec<Column> = key_columns.iter().map(|c| c.take(&first_rows)).collect();

    for rule in aggregations {
        let source = table
            .column(&rule.column)
            .ok_or_else(|| SiftError::missing_column(Stage::Aggregate, &rule.column))?;

        let values = partitions
            .iter()
            .map(|p| aggregate(rule.function, source, &p.rows))
            .collect::<Result<Vec<_>>>()?;

        let name = unique_column_name(aggregate_column_name(&rule.column, rule.function), &mut taken);
        columns.push(Column::new(
            name,
            result_type(rule.function, source.kind()),
            values,
        ));
    }

    tracing::debug!(
        partitions = partitions.len(),
        aggregations = aggregations.len(),
        "Grouped table"
    );
    Table::new(columns)
}

fn partition(row_count: usize, key_columns: &[&Column]) -> Vec<Partition> {
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();

    'rows: for row in 0..row_count {
        let mut key = Vec::with_capacity(key_columns.len());
        for column in key_columns {
            match column.get(row) {
                Some(cell) if !cell.is_null() => key.push(cell.to_string()),
                _ => continue 'rows,
            }
        }

        if let Some(&pos) = index.get(&key) {
            if let Some(p) = partitions.get_mut(pos) {
                p.rows.push(row);
            }
        } else {
            index.insert(key, partitions.len());
            partitions.push(Partition { rows: vec![row] });
        }
    }
    partitions
}

fn result_type(function: AggregateFunction, source: SemanticType) -> SemanticType {
    match function {
        AggregateFunction::Count => SemanticType::Int64,
        AggregateFunction::Mean | AggregateFunction::Std => SemanticType::Float64,
        AggregateFunction::Max | AggregateFunction::Min => source,
        AggregateFunction::Sum => match source {
            SemanticType::Int64 | SemanticType::Bool => SemanticType::Int64,
            _ => SemanticType::Float64,
        },
    }
}

/// Numeric view used by sum/mean/std; booleans count as 0 and 1.
fn numeric(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Bool(b) => Some(f64::from(*b)),
        other => other.as_f64(),
    }
}

fn aggregate(function: AggregateFunction, column: &Column, rows: &[usize]) -> Result<CellValue> {
    let cells: Vec<&CellValue> = rows
        .iter()
        .filter_map(|&r| column.get(r))
        .filter(|c| !c.is_null())
        .collect();

    if function.requires_numeric() && column.kind() == SemanticType::Text {
        return Err(SiftError::execution(
            Stage::Aggregate,
            column.name(),
            format!("'{function}' needs a numeric column, found text"),
        ));
    }

    let value = match function {
        AggregateFunction::Count => CellValue::Int64(i64::try_from(cells.len()).unwrap_or(i64::MAX)),
        AggregateFunction::Sum => sum(column, &cells)?,
        AggregateFunction::Mean => {
            let values: Vec<f64> = cells.iter().filter_map(|c| numeric(c)).collect();
            mean(&values).map_or(CellValue::Null, CellValue::Float64)
        }
        AggregateFunction::Std => {
            let values: Vec<f64> = cells.iter().filter_map(|c| numeric(c)).collect();
            sample_std(&values).map_or(CellValue::Null, CellValue::Float64)
        }
        AggregateFunction::Max => cells
            .iter()
            .max_by(|a, b| a.sort_cmp(b))
            .map_or(CellValue::Null, |c| (*c).clone()),
        AggregateFunction::Min => cells
            .iter()
            .min_by(|a, b| a.sort_cmp(b))
            .map_or(CellValue::Null, |c| (*c).clone()),
    };
    Ok(value)
}

fn sum(column: &Column, cells: &[&CellValue]) -> Result<CellValue> {
    match column.kind() {
        SemanticType::Int64 => {
            let mut total: i64 = 0;
            for cell in cells {
                if let CellValue::Int64(v) = cell {
                    total = total.checked_add(*v).ok_or_else(|| {
                        SiftError::execution(Stage::Aggregate, column.name(), "integer sum overflows")
                    })?;
                }
            }
            Ok(CellValue::Int64(total))
        }
        SemanticType::Bool => {
            let trues = cells.iter().filter(|c| matches!(c, CellValue::Bool(true))).count();
            Ok(CellValue::Int64(i64::try_from(trues).unwrap_or(i64::MAX)))
        }
        _ => Ok(CellValue::Float64(cells.iter().filter_map(|c| numeric(c)).sum())),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (N - 1 denominator).
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{LoadOptions, load_csv};

    fn table(csv: &str) -> Table {
        load_csv(csv.as_bytes(), &LoadOptions::default()).unwrap()
    }

    fn column_values(table: &Table, name: &str) -> Vec<CellValue> {
        table.column(name).unwrap().values().to_vec()
    }

    #[test]
    fn test_sum_and_count_per_group() {
        let t = table("group,val\nx,1\nx,2\ny,3\n");
        let out = group_and_aggregate(
            &t,
            &GroupSpec::by(["group"]),
            &[
                AggregationRule::new("val", AggregateFunction::Sum),
                AggregationRule::new("val", AggregateFunction::Count),
            ],
        )
        .unwrap();

        assert_eq!(out.column_names(), vec!["group", "val_sum", "val_count"]);
        assert_eq!(column_values(&out, "group"), vec![CellValue::from("x"), CellValue::from("y")]);
        assert_eq!(column_values(&out, "val_sum"), vec![CellValue::Int64(3), CellValue::Int64(3)]);
        assert_eq!(column_values(&out, "val_count"), vec![CellValue::Int64(2), CellValue::Int64(1)]);
    }

    #[test]
    fn test_partitions_in_first_appearance_order() {
        let t = table("k,v\nb,1\na,2\nb,3\nc,4\n");
        let out = group_and_aggregate(&t, &GroupSpec::by(["k"]), &[]).unwrap();
        assert_eq!(
            column_values(&out, "k"),
            vec![CellValue::from("b"), CellValue::from("a"), CellValue::from("c")]
        );
    }

    #[test]
    fn test_multi_column_keys() {
        let t = table("a,b,v\n1,x,1\n1,y,2\n1,x,3\n2,x,4\n");
        let out = group_and_aggregate(
            &t,
            &GroupSpec::by(["a", "b"]),
            &[AggregationRule::new("v", AggregateFunction::Max)],
        )
        .unwrap();
        assert_eq!(out.row_count(), 3);
        assert_eq!(column_values(&out, "v_max"), vec![CellValue::Int64(3), CellValue::Int64(2), CellValue::Int64(4)]);
    }

    #[test]
    fn test_mean_and_sample_std() {
        let t = table("g,v\na,2\na,4\na,4\na,4\na,5\na,5\na,7\na,9\nb,1\n");
        let out = group_and_aggregate(
            &t,
            &GroupSpec::by(["g"]),
            &[
                AggregationRule::new("v", AggregateFunction::Mean),
                AggregationRule::new("v", AggregateFunction::Std),
            ],
        )
        .unwrap();

        assert_eq!(out.cell(0, "v_mean"), Some(&CellValue::Float64(5.0)));
        let Some(CellValue::Float64(std)) = out.cell(0, "v_std") else {
            panic!("expected float std");
        };
        // sum of squared deviations is 32 over 8 values
        assert!((std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(out.cell(1, "v_std"), Some(&CellValue::Null));
    }

    #[test]
    fn test_count_skips_nulls_and_all_null_partition() {
        let t = table("g,v\na,\na,1\nb,\n");
        let out = group_and_aggregate(
            &t,
            &GroupSpec::by(["g"]),
            &[
                AggregationRule::new("v", AggregateFunction::Count),
                AggregationRule::new("v", AggregateFunction::Sum),
                AggregationRule::new("v", AggregateFunction::Min),
                AggregationRule::new("v", AggregateFunction::Mean),
            ],
        )
        .unwrap();
        assert_eq!(column_values(&out, "v_count"), vec![CellValue::Int64(1), CellValue::Int64(0)]);
        assert_eq!(column_values(&out, "v_sum"), vec![CellValue::Int64(1), CellValue::Int64(0)]);
        assert_eq!(column_values(&out, "v_min"), vec![CellValue::Int64(1), CellValue::Null]);
        assert_eq!(
            column_values(&out, "v_mean"),
            vec![CellValue::Float64(1.0), CellValue::Null]
        );
    }

    #[test]
    fn test_null_keys_are_excluded() {
        let t = table("g,v\na,1\n,2\na,3\n");
        let out = group_and_aggregate(
            &t,
            &GroupSpec::by(["g"]),
            &[AggregationRule::new("v", AggregateFunction::Sum)],
        )
        .unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.cell(0, "v_sum"), Some(&CellValue::Int64(4)));
    }

    #[test]
    fn test_name_collisions_get_suffixes() {
        let t = table("g,v,v_sum\na,1,5\n");
        let out = group_and_aggregate(
            &t,
            &GroupSpec::by(["g", "v_sum"]),
            &[
                AggregationRule::new("v", AggregateFunction::Sum),
                AggregationRule::new("v", AggregateFunction::Sum),
            ],
        )
        .unwrap();
        assert_eq!(out.column_names(), vec!["g", "v_sum", "v_sum_1", "v_sum_2"]);
    }

    #[test]
    fn test_text_min_max_and_sum_error() {
        let t = table("g,name\na,pear\na,apple\n");
        let out = group_and_aggregate(
            &t,
            &GroupSpec::by(["g"]),
            &[
                AggregationRule::new("name", AggregateFunction::Min),
                AggregationRule::new("name", AggregateFunction::Max),
            ],
        )
        .unwrap();
        assert_eq!(out.cell(0, "name_min"), Some(&CellValue::from("apple")));
        assert_eq!(out.cell(0, "name_max"), Some(&CellValue::from("pear")));

        let err = group_and_aggregate(
            &t,
            &GroupSpec::by(["g"]),
            &[AggregationRule::new("name", AggregateFunction::Sum)],
        )
        .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Aggregate));
    }

    #[test]
    fn test_float_and_bool_sums() {
        let t = table("g,f,b\na,1.5,true\na,2.0,true\na,,false\n");
        let out = group_and_aggregate(
            &t,
            &GroupSpec::by(["g"]),
            &[
                AggregationRule::new("f", AggregateFunction::Sum),
                AggregationRule::new("b", AggregateFunction::Sum),
            ],
        )
        .unwrap();
        assert_eq!(out.cell(0, "f_sum"), Some(&CellValue::Float64(3.5)));
        assert_eq!(out.cell(0, "b_sum"), Some(&CellValue::Int64(2)));
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        let t = table(&format!("g,v\na,{}\na,1\n", i64::MAX));
        let err = group_and_aggregate(
            &t,
            &GroupSpec::by(["g"]),
            &[AggregationRule::new("v", AggregateFunction::Sum)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_unique_column_name() {
        let mut taken: HashSet<String> = ["a".to_owned()].into_iter().collect();
        assert_eq!(unique_column_name("b".to_owned(), &mut taken), "b");
        assert_eq!(unique_column_name("a".to_owned(), &mut taken), "a_1");
        assert_eq!(unique_column_name("a".to_owned(), &mut taken), "a_2");
    }
}

//! Partitioning of runs by configuration columns.

use std::collections::BTreeMap;

use analizar_common::{AnalizarError, Result};

use crate::runs::{ConfigColumn, Label, Run, RunTable};

/// Runs sharing one combination of grouping-key values.
#[derive(Debug)]
pub(crate) struct Group<'a> {
    pub key: Vec<Label>,
    pub retained: Vec<Label>,
    pub members: Vec<&'a Run>,
    pub description: String,
}

/// Human-readable group name, e.g. `(Function=f001, Instance=i02)`.
pub fn describe_group(keys: &[ConfigColumn], values: &[Label]) -> String {
    let parts: Vec<String> =
        keys.iter().zip(values).map(|(column, value)| format!("{column}={value}")).collect();
    format!("({})", parts.join(", "))
}

/// Partition `table` into observed key combinations, ordered by key.
///
/// Members keep table order. Every `retained` column must hold a single
/// value within each group.
pub(crate) fn group_runs<'a>(
    table: &'a RunTable,
    keys: &[ConfigColumn],
    retained: &[ConfigColumn],
) -> Result<Vec<Group<'a>>> {
    let mut partitions: BTreeMap<Vec<Label>, Vec<&'a Run>> = BTreeMap::new();
    for run in table {
        let key = keys.iter().map(|c| c.value(run)).collect();
        partitions.entry(key).or_default().push(run);
    }

    partitions
        .into_iter()
        .map(|(key, members)| {
            let description = describe_group(keys, &key);
            let retained = retained
                .iter()
                .map(|&column| constant_value(column, &members, &description))
                .collect::<Result<Vec<_>>>()?;
            Ok(Group { key, retained, members, description })
        })
        .collect()
}

fn constant_value(column: ConfigColumn, members: &[&Run], group: &str) -> Result<Label> {
    let mut values: Vec<Label> = Vec::new();
    for run in members {
        let value = column.value(run);
        if !values.contains(&value) {
            values.push(value);
        }
    }
    match values.len() {
        1 => Ok(values.remove(0)),
        _ => Err(AnalizarError::GroupInconsistency {
            column: column.name().into(),
            group: group.into(),
            values: values.iter().map(Label::to_string).collect(),
        }),
    }
}

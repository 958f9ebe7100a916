//! Column reconciliation: source headers -> canonical names.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::spec::{SpecColumnRules, SpecReconciledSchema};

/// Rename source headers through the alias table, then drop ignored and blank columns.
///
/// Header cells are trimmed before lookup; headers without an alias keep their
/// name. When two source columns reach the same canonical name, the first one
/// wins and the later one is dropped with a warning. `idx_status` points at the
/// column whose canonical name is `col_status`.
pub fn reconcile_columns(
    columns: &[String],
    rules: &SpecColumnRules,
    col_status: &str,
) -> SpecReconciledSchema {
    let set_ignored: BTreeSet<&str> = rules.ignored.iter().map(|c| c.trim()).collect();
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    let mut schema = SpecReconciledSchema::default();

    for c_raw in columns {
        let c_source = c_raw.trim().to_string();
        let c_canonical = rules
            .aliases
            .get(&c_source)
            .map(|c| c.trim().to_string())
            .unwrap_or_else(|| c_source.clone());

        let canonical = if c_canonical.is_empty() || set_ignored.contains(c_canonical.as_str()) {
            None
        } else if set_seen.contains(&c_canonical) {
            let c_msg = format!(
                "column {c_source:?} maps to {c_canonical:?} which is already mapped; dropped"
            );
            warn!(column = %c_source, canonical = %c_canonical, "duplicate canonical column dropped");
            schema.warnings.push(c_msg);
            None
        } else {
            set_seen.insert(c_canonical.clone());
            Some(c_canonical)
        };

        if schema.idx_status.is_none() && canonical.as_deref() == Some(col_status) {
            schema.idx_status = Some(schema.columns_source.len());
        }
        schema.columns_source.push(c_source);
        schema.columns_canonical.push(canonical);
    }
    schema
}

/// Canonical field map of one source row. Dropped columns are skipped.
pub fn project_row(schema: &SpecReconciledSchema, row: &[String]) -> BTreeMap<String, String> {
    schema
        .columns_canonical
        .iter()
        .enumerate()
        .filter_map(|(n_idx, canonical)| {
            let c_name = canonical.as_ref()?;
            let c_value = row.get(n_idx).cloned().unwrap_or_default();
            Some((c_name.clone(), c_value))
        })
        .collect()
}

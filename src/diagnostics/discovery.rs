use super::table::Table;
use crate::models::Target;

/// SSH targets for every node whose ROLES column contains `role`.
///
/// Reads `get nodes -o wide` output by header (`NAME`, `ROLES`,
/// `INTERNAL-IP`), falling back to columns 0, 2 and 5.
pub fn discover_targets(nodes_wide: &str, role: &str) -> Vec<Target> {
    let table = Table::parse(nodes_wide);
    table
        .rows()
        .iter()
        .filter_map(|row| {
            let name = table.cell(row, "NAME", 0)?;
            let roles = table.cell(row, "ROLES", 2)?;
            let address = table.cell(row, "INTERNAL-IP", 5)?;
            roles
                .split(',')
                .any(|r| r.trim() == role)
                .then(|| Target::ssh(name, address))
        })
        .collect()
}

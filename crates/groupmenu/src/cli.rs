//! CLI command implementations.
//!
//! Each command reads through an [`AppState`] and prints either an aligned
//! table or pretty JSON.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::error::GroupMenuError;
use crate::list::{
    ContentListProvider, GroupMenuContentListProvider, ListTable, MenuListProvider,
    OPERATIONS_COLUMN,
};
use crate::models::{Account, CONFIG_PREFIX};
use crate::state::AppState;
use crate::storage::{Page, missing_tables};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Table,
    Json,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Format rows as left-aligned columns with a header rule.
pub fn format_columns(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = widths.get(i).copied().unwrap_or(0);
                format!("{cell:<width$}")
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let mut out = String::new();
    out.push_str(&line(header));
    out.push('\n');
    out.push_str(&"-".repeat(total));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Format a rendered list, one operation title per row joined by `, `.
pub fn format_list(table: &ListTable) -> String {
    if table.is_empty() {
        return format!("{}\n", table.empty);
    }

    let header: Vec<String> = table
        .header
        .iter()
        .map(|(_, label)| label.to_uppercase())
        .collect();
    let has_operations = table.header.iter().any(|(key, _)| *key == OPERATIONS_COLUMN);

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = row.cells.iter().map(|(_, v)| v.clone()).collect();
            if has_operations {
                cells.push(
                    row.operations
                        .iter()
                        .map(|op| op.title.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                );
            }
            cells
        })
        .collect();

    format_columns(&header, &rows)
}

/// Show the overlays the group menu override produces for an account.
///
/// With no names, every content type config object is resolved. With
/// `merged`, the full config objects are printed with overrides applied.
pub async fn cmd_overrides(
    state: &AppState,
    names: Vec<String>,
    account: &Account,
    merged: bool,
    output: Output,
) -> Result<()> {
    let names = if names.is_empty() {
        state.config_store().list_names(CONFIG_PREFIX).await?
    } else {
        names
    };

    if merged {
        let objects = state
            .config_factory()
            .load_multiple(&names, account)
            .await?;
        return print_json(&objects);
    }

    let overlays = state.overrides().resolve(&names, account).await?;

    if output == Output::Json {
        return print_json(&overlays);
    }

    if overlays.is_empty() {
        println!("No overrides for {}.", account_label(account));
        return Ok(());
    }

    let header = vec!["CONFIG".to_string(), "AVAILABLE MENUS".to_string()];
    let rows: Vec<Vec<String>> = overlays
        .iter()
        .map(|(name, overlay)| vec![name.clone(), overlay.available_menus.join(", ")])
        .collect();
    print!("{}", format_columns(&header, &rows));

    Ok(())
}

/// Show the menu overview (menus not related to any group).
pub async fn cmd_menus(state: &AppState, account: Account, page: Page, output: Output) -> Result<()> {
    let provider = MenuListProvider::new(state.groups().clone(), state.menus().clone(), account)
        .with_limit(page.size)
        .with_page(page.number);
    let table = provider.render().await?;

    match output {
        Output::Json => print_json(&table),
        Output::Table => {
            print!("{}", format_list(&table));
            if let Some(hint) = next_page_hint(&table, page) {
                println!("{hint}");
            }
            Ok(())
        }
    }
}

/// Show the menus related to one group, with the group's menu operations.
pub async fn cmd_group_menus(
    state: &AppState,
    group_id: Uuid,
    account: Account,
    page: Page,
    output: Output,
) -> Result<()> {
    let group = state
        .groups()
        .load_group(group_id)
        .await?
        .ok_or(GroupMenuError::GroupNotFound(group_id))?;

    let group_operations = state.access().group_operations(&group, &account).await?;
    let label = group.label.clone();

    let provider = GroupMenuContentListProvider::new(
        state.groups().clone(),
        state.access().clone(),
        group,
        account,
    )
    .with_limit(page.size)
    .with_page(page.number);
    let table = provider.render().await?;

    if output == Output::Json {
        #[derive(Serialize)]
        struct GroupMenus<'a> {
            group: &'a str,
            operations: &'a [crate::list::Operation],
            list: &'a ListTable,
        }
        return print_json(&GroupMenus {
            group: &label,
            operations: &group_operations,
            list: &table,
        });
    }

    println!("Group: {label}");
    for op in &group_operations {
        println!("  {} -> {}", op.title, op.href());
    }
    println!();
    print!("{}", format_list(&table));
    if let Some(hint) = next_page_hint(&table, page) {
        println!("{hint}");
    }

    Ok(())
}

/// Pointer to the next page when this one came back full.
pub fn next_page_hint(table: &ListTable, page: Page) -> Option<String> {
    let size = page.size?;
    (table.rows.len() == size).then(|| {
        format!(
            "Page {} of at most {size} rows; use --page {} for more.",
            page.number,
            page.number + 1
        )
    })
}

/// List every group permission of every registered relation plugin.
pub fn cmd_permissions(state: &AppState, output: Output) -> Result<()> {
    let listing = state.registry().permission_listing();

    if output == Output::Json {
        return print_json(&listing);
    }

    let header = vec!["PERMISSION".to_string(), "TITLE".to_string()];
    let rows: Vec<Vec<String>> = listing
        .iter()
        .map(|p| vec![p.permission.to_string(), p.title.clone()])
        .collect();
    print!("{}", format_columns(&header, &rows));

    Ok(())
}

/// Check the backend: snapshot warnings or missing database tables.
pub async fn cmd_check(state: &AppState, pool: Option<&sqlx::PgPool>) -> Result<()> {
    if let Some(snapshot) = state.snapshot() {
        let warnings = snapshot.warnings();
        if warnings.is_empty() {
            println!("Snapshot OK.");
        } else {
            println!("Snapshot loaded with {} warning(s):", warnings.len());
            for warning in warnings {
                println!("  {warning}");
            }
        }
    }

    if let Some(pool) = pool {
        let missing = missing_tables(pool).await?;
        if !missing.is_empty() {
            return Err(GroupMenuError::MissingTables(missing).into());
        }
        println!("Database schema OK.");
    }

    let mut counts = BTreeMap::new();
    counts.insert("plugins", state.registry().plugins().count());
    counts.insert("permissions", state.registry().permission_table().len());
    let names = state.config_store().list_names(CONFIG_PREFIX).await?;
    counts.insert("content types", names.len());
    for (what, count) in counts {
        println!("{what}: {count}");
    }

    Ok(())
}

fn account_label(account: &Account) -> String {
    if account.is_anonymous() {
        "anonymous".to_string()
    } else {
        format!("{} ({})", account.name, account.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::list::{ListRow, Operation};

    #[test]
    fn columns_align_to_widest_cell() {
        let out = format_columns(
            &["NAME".to_string(), "MENUS".to_string()],
            &[vec!["node.type.article".to_string(), "main".to_string()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "NAME               MENUS");
        assert_eq!(lines[1], "-".repeat(24));
        assert_eq!(lines[2], "node.type.article  main");
    }

    #[test]
    fn empty_list_prints_empty_text() {
        let table = ListTable {
            header: vec![("title", "Title".to_string())],
            rows: Vec::new(),
            empty: "There are no menus yet.".to_string(),
        };
        assert_eq!(format_list(&table), "There are no menus yet.\n");
    }

    #[test]
    fn list_rows_include_operation_titles() {
        let table = ListTable {
            header: vec![
                ("label", "Content label".to_string()),
                (OPERATIONS_COLUMN, "Operations".to_string()),
            ],
            rows: vec![ListRow {
                id: "1".to_string(),
                cells: vec![("label", "Main".to_string())],
                operations: vec![
                    Operation::new("edit", "Edit relation", "/e", 10),
                    Operation::new("delete", "Delete relation", "/d", 100),
                ],
            }],
            empty: String::new(),
        };
        let out = format_list(&table);
        assert!(out.starts_with("CONTENT LABEL  OPERATIONS"));
        assert!(out.contains("Main           Edit relation, Delete relation"));
    }

    #[test]
    fn full_page_points_at_the_next_one() {
        let row = |id: &str| ListRow {
            id: id.to_string(),
            cells: Vec::new(),
            operations: Vec::new(),
        };
        let table = ListTable {
            header: Vec::new(),
            rows: vec![row("a"), row("b")],
            empty: String::new(),
        };

        assert_eq!(
            next_page_hint(&table, Page::new(Some(2), 0)).as_deref(),
            Some("Page 0 of at most 2 rows; use --page 1 for more.")
        );
        assert_eq!(next_page_hint(&table, Page::new(Some(3), 0)), None);
        assert_eq!(next_page_hint(&table, Page::default()), None);
    }
}

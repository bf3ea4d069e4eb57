// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::models::{Category, TxKind};
use crate::utils::{id_for_category, maybe_print_json, optional_arg, pretty_table, required_arg};
use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub kind: TxKind,
    pub parent: Option<String>,
    pub transactions: i64,
    pub recurring: i64,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required_arg(sub, "name")?;
            let kind: TxKind = required_arg(sub, "type")?.parse()?;
            let parent = optional_arg(sub, "parent");
            add_category(conn, name, kind, parent)?;
            match parent {
                Some(p) => println!("Added {} category '{}' under '{}'", kind, name, p),
                None => println!("Added {} category '{}'", kind, name),
            }
        }
        Some(("list", sub)) => {
            let rows = list_rows(conn)?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                return Ok(());
            }
            let data = rows
                .into_iter()
                .map(|r| {
                    let name = match &r.parent {
                        Some(p) => format!("{} / {}", p, r.name),
                        None => r.name,
                    };
                    vec![
                        r.id.to_string(),
                        name,
                        r.kind.to_string(),
                        r.transactions.to_string(),
                        r.recurring.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["ID", "Category", "Type", "Transactions", "Recurring"], data)
            );
        }
        Some(("rm", sub)) => {
            let name = required_arg(sub, "name")?;
            let id = id_for_category(conn, name)?;
            // Foreign keys null out category_id on transactions and templates, and
            // parent_id on subcategories.
            let (txs, templates) = usage(conn)?
                .into_iter()
                .find(|(c, _, _)| c.id == id)
                .map(|(_, t, r)| (t, r))
                .unwrap_or_default();
            let children: i64 = conn.query_row(
                "SELECT COUNT(*) FROM categories WHERE parent_id=?1",
                params![id],
                |r| r.get(0),
            )?;
            conn.execute("DELETE FROM categories WHERE id=?1", params![id])?;
            println!(
                "Removed category '{}' ({} transaction(s), {} template(s) now uncategorized, {} subcategor(ies) moved to top level)",
                name, txs, templates, children
            );
        }
        _ => {}
    }
    Ok(())
}

/// Creates a category. A parent must already exist, be top-level, and share `kind`.
pub fn add_category(
    conn: &Connection,
    name: &str,
    kind: TxKind,
    parent: Option<&str>,
) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Category name cannot be empty");
    }
    let parent_id = match parent {
        None => None,
        Some(p) => {
            let pid = id_for_category(conn, p)?;
            let (parent_kind, grandparent): (String, Option<i64>) = conn.query_row(
                "SELECT type, parent_id FROM categories WHERE id=?1",
                params![pid],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            let parent_kind: TxKind = parent_kind
                .parse()
                .with_context(|| format!("Category '{}' has an unknown type", p))?;
            if parent_kind != kind {
                bail!("Parent '{}' is an {} category, not {}", p, parent_kind, kind);
            }
            if grandparent.is_some() {
                bail!("'{}' is already a subcategory; nest under a top-level category", p);
            }
            Some(pid)
        }
    };
    conn.execute(
        "INSERT INTO categories(name, type, parent_id) VALUES (?1, ?2, ?3)",
        params![name, kind.as_str(), parent_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Categories with their parent's name, top-level ones first under each parent.
pub fn list_rows(conn: &Connection) -> Result<Vec<CategoryRow>> {
    let usage = usage(conn)?;
    let names: HashMap<i64, String> = usage.iter().map(|(c, _, _)| (c.id, c.name.clone())).collect();
    let mut rows: Vec<CategoryRow> = usage
        .into_iter()
        .map(|(c, transactions, recurring)| CategoryRow {
            id: c.id,
            parent: c.parent_id.and_then(|p| names.get(&p).cloned()),
            name: c.name,
            kind: c.kind,
            transactions,
            recurring,
        })
        .collect();
    rows.sort_by(|a, b| {
        let key = |r: &CategoryRow| (r.parent.clone().unwrap_or_else(|| r.name.clone()), r.parent.is_some());
        key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
    });
    Ok(rows)
}

/// Each category with how many transactions and recurring templates reference it.
fn usage(conn: &Connection) -> Result<Vec<(Category, i64, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.type, c.parent_id,
                (SELECT COUNT(*) FROM transactions t WHERE t.category_id=c.id),
                (SELECT COUNT(*) FROM recurring r WHERE r.category_id=c.id)
         FROM categories c ORDER BY c.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<i64>>(3)?,
            r.get::<_, i64>(4)?,
            r.get::<_, i64>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, kind, parent_id, txs, templates) = row?;
        match kind.parse::<TxKind>() {
            Ok(kind) => out.push((
                Category {
                    id,
                    name,
                    kind,
                    parent_id,
                },
                txs,
                templates,
            )),
            Err(err) => warn!(category = id, "skipping category: {}", err),
        }
    }
    Ok(out)
}

use std::io::{self, Write};

use anyhow::{bail, Context, Result};

use crate::{Database, QueryOutput};

pub fn execute_command(database_path: &str, command: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(database_path, command, &mut out)?;
    out.flush()?;
    Ok(())
}

pub fn run_command(database_path: &str, command: &str, out: &mut impl Write) -> Result<()> {
    let mut db = Database::open(database_path)
        .with_context(|| format!("failed to open database {database_path}"))?;

    match command.trim() {
        ".dbinfo" => handle_dbinfo(&mut db, out),
        ".tables" => handle_tables(&mut db, out),
        ".schema" => handle_schema(&mut db, out),
        dot if dot.starts_with('.') => bail!("Unknown command: {dot}"),
        query => handle_sql_query(&mut db, query, out),
    }
}

fn handle_dbinfo(db: &mut Database, out: &mut impl Write) -> Result<()> {
    writeln!(out, "database page size: {}", db.page_size())?;
    writeln!(out, "number of tables: {}", db.table_count()?)?;
    Ok(())
}

fn handle_tables(db: &mut Database, out: &mut impl Write) -> Result<()> {
    let table_names = db.table_names()?;
    writeln!(out, "{}", table_names.join(" "))?;
    Ok(())
}

fn handle_schema(db: &mut Database, out: &mut impl Write) -> Result<()> {
    for obj in db.schema_objects()? {
        writeln!(
            out,
            "{}: {} (table: {}, page: {})",
            obj.object_type, obj.name, obj.tbl_name, obj.root_page
        )?;
        if let Some(sql) = &obj.sql {
            writeln!(out, "  SQL: {}", sql)?;
        }
    }
    Ok(())
}

fn handle_sql_query(db: &mut Database, query: &str, out: &mut impl Write) -> Result<()> {
    match query.split_whitespace().next().map(|s| s.to_lowercase()).as_deref() {
        Some("select") => {}
        _ => bail!("Unsupported SQL command: {}", query),
    }

    match db.query(query).with_context(|| format!("query failed: {query}"))? {
        QueryOutput::Count(count) => writeln!(out, "{}", count)?,
        QueryOutput::Rows(rows) => {
            for row in rows {
                writeln!(out, "{}", row.join("|"))?;
            }
        }
    }
    Ok(())
}

mod common;

use common::*;
use sqlite_scan::run_command;
use tempfile::NamedTempFile;

fn run(file: &NamedTempFile, command: &str) -> anyhow::Result<String> {
    let mut out = Vec::new();
    run_command(file.path().to_str().unwrap(), command, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn dbinfo() {
    let file = write_temp(&apples_db());
    assert_eq!(
        run(&file, ".dbinfo").unwrap(),
        "database page size: 4096\nnumber of tables: 2\n"
    );
}

#[test]
fn tables() {
    let file = write_temp(&apples_db());
    assert_eq!(run(&file, ".tables").unwrap(), "apples\n");
}

#[test]
fn schema_dump() {
    let file = write_temp(&apples_db());
    let output = run(&file, ".schema").unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "table: apples (table: apples, page: 2)");
    assert_eq!(lines[1], format!("  SQL: {APPLES_SQL}"));
    assert_eq!(lines[2], "index: idx_apples_name (table: apples, page: 3)");
}

#[test]
fn schema_dump_lists_views_and_triggers() {
    let view_sql = "CREATE VIEW red_apples AS SELECT name FROM apples WHERE color = 'Red'";
    let trigger_sql = "CREATE TRIGGER apples_audit AFTER INSERT ON apples BEGIN SELECT 1; END";
    let file = write_temp(&database(
        &[
            schema_row("table", "apples", "apples", 2, Some(APPLES_SQL)),
            schema_row("view", "red_apples", "red_apples", 0, Some(view_sql)),
            schema_row("trigger", "apples_audit", "apples", 0, Some(trigger_sql)),
        ],
        vec![page(2, LEAF_TABLE, &apple_rows(), None)],
    ));
    let output = run(&file, ".schema").unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[2], "view: red_apples (table: red_apples, page: 0)");
    assert_eq!(lines[3], format!("  SQL: {view_sql}"));
    assert_eq!(lines[4], "trigger: apples_audit (table: apples, page: 0)");
    assert_eq!(lines[5], format!("  SQL: {trigger_sql}"));
}

#[test]
fn select_prints_one_line_per_row() {
    let file = write_temp(&apples_db());
    assert_eq!(
        run(&file, "SELECT name, color FROM apples").unwrap(),
        "Fuji|Red\nGala|Yellow\nHoneycrisp|Blush Red\n"
    );
    assert_eq!(run(&file, "SELECT COUNT(*) FROM apples").unwrap(), "3\n");
    assert_eq!(
        run(&file, "SELECT id FROM apples WHERE name = 'Gala'").unwrap(),
        "2\n"
    );
}

#[test]
fn query_errors_surface_with_context() {
    let file = write_temp(&apples_db());
    let err = run(&file, "SELECT weight FROM apples").unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("query failed"), "{message}");
    assert!(message.contains("Column 'weight' not found in table 'apples'"), "{message}");
}

#[test]
fn unsupported_commands() {
    let file = write_temp(&apples_db());
    assert!(run(&file, ".indexes").is_err());
    assert!(run(&file, "DELETE FROM apples").is_err());
}

#[test]
fn missing_file() {
    let mut out = Vec::new();
    let err = run_command("/nonexistent/db.sqlite", ".dbinfo", &mut out).unwrap_err();
    assert!(format!("{err:#}").contains("failed to open database"));
}

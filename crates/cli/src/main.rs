use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pmgrid_core::prelude::*;
use pmgrid_engine::{TableConfig, TableEngine};
use serde_json::{json, Value};
use tracing::{info, warn};

mod demo;

use demo::DemoSet;

#[derive(Parser, Debug)]
#[command(name = "pmgridctl", version, about = "Filter, sort and page JSON row sets")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one page of a row set after filtering and sorting
    Show {
        /// JSON file holding an array of row objects
        #[arg(long = "input", conflicts_with = "demo")]
        input: Option<PathBuf>,
        /// Built-in dataset
        #[arg(long = "demo", value_enum)]
        demo: Option<DemoSet>,
        /// Field filter, `key=value[:text|select|date]` (repeatable)
        #[arg(long = "filter", value_parser = FieldFilter::parse_spec)]
        filters: Vec<FieldFilter>,
        /// Case-insensitive quick search across all columns
        #[arg(long = "search")]
        search: Option<String>,
        /// Column key (dotted paths like `address.city` allowed); repeat to walk
        /// ascending, descending, unsorted
        #[arg(long = "sort")]
        sort: Vec<String>,
        #[arg(long = "page", default_value_t = 1)]
        page: usize,
        /// Rows per page (default: PMGRID_PAGE_SIZE or 10)
        #[arg(long = "page-size")]
        page_size: Option<usize>,
    },
    /// List column descriptors and filter fields of a demo dataset
    Columns {
        #[arg(long = "demo", value_enum)]
        demo: DemoSet,
    },
}

fn init_tracing() {
    let env = std::env::var("PMGRID_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

struct Source {
    columns: Vec<ColumnSpec>,
    rows: Value,
    registry: FormatterRegistry,
}

fn load_input(path: &Path) -> Result<Source> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let rows: Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    if !rows.is_array() {
        warn!(path = %path.display(), "input is not a JSON array; treating it as empty");
    }
    Ok(Source { columns: columns_from_rows(&rows), rows, registry: FormatterRegistry::new() })
}

/// One plain column per leaf path, in first-seen order. Nested objects become
/// dotted keys (`address.city`); a path that holds an object in some row keeps only its leaves.
fn columns_from_rows(rows: &Value) -> Vec<ColumnSpec> {
    let mut keys: Vec<String> = Vec::new();
    for row in rows.as_array().into_iter().flatten() {
        if let Value::Object(map) = row {
            collect_paths(map, "", &mut keys);
        }
    }
    let is_parent = |k: &str| {
        keys.iter().any(|o| o.len() > k.len() && o.starts_with(k) && o.as_bytes()[k.len()] == b'.')
    };
    keys.iter().filter(|k| !is_parent(k.as_str())).map(|k| col(k, k)).collect()
}

fn collect_paths(map: &serde_json::Map<String, Value>, prefix: &str, keys: &mut Vec<String>) {
    for (k, v) in map {
        let path = if prefix.is_empty() { k.clone() } else { format!("{}.{}", prefix, k) };
        match v {
            Value::Object(inner) if !inner.is_empty() => collect_paths(inner, &path, keys),
            _ => {
                if !keys.contains(&path) {
                    keys.push(path);
                }
            }
        }
    }
}

/// Each key is one header click. Keys outside the registered columns are rejected.
fn apply_sorts(engine: &mut TableEngine, keys: &[String]) -> Result<()> {
    for key in keys {
        if column_by_key(engine.columns(), key).is_none() {
            return Err(TableError::UnknownColumn(key.clone()).into());
        }
        engine.sort(key);
    }
    Ok(())
}

fn format_name(format: &CellFormat) -> &'static str {
    match format {
        CellFormat::Plain => "plain",
        CellFormat::Mapped { .. } => "mapped",
        CellFormat::Boolean { .. } => "boolean",
        CellFormat::DateTime { .. } => "date_time",
        CellFormat::Number { .. } => "number",
        CellFormat::Named { .. } => "named",
    }
}

/// Padded header with sort indicators, rendered rows, pager footer.
fn render_table(engine: &TableEngine, registry: &FormatterRegistry) -> String {
    let page = engine.visible_page();
    let header = engine.header_labels();
    let cells: Vec<Vec<String>> =
        page.rows.iter().map(|r| engine.render_row(r, registry)).collect();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row) {
            *w = (*w).max(c.chars().count());
        }
    }
    let line = |items: &[String]| -> String {
        items
            .iter()
            .zip(&widths)
            .map(|(s, w)| format!("{:<w$}", s, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(&header)];
    out.extend(cells.iter().map(|r| line(r)));
    let pager: Vec<String> = page
        .page_numbers(5)
        .into_iter()
        .map(|n| if n == page.current_page { format!("[{}]", n) } else { n.to_string() })
        .collect();
    out.push(format!(
        "{}  page {}/{}  {}",
        page.range_label(),
        page.current_page,
        page.total_pages.max(1),
        pager.join(" ")
    ));
    out.join("\n")
}

fn page_json(engine: &TableEngine) -> Value {
    let page = engine.visible_page();
    json!({
        "page": {
            "current": page.current_page,
            "size": page.page_size,
            "total_items": page.total_items,
            "total_pages": page.total_pages,
            "sort": engine.sort_state(),
            "filters": engine.filters(),
        },
        "rows": page.rows,
    })
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show { input, demo, filters, search, sort, page, page_size } => {
            let source = match (input, demo) {
                (Some(path), _) => load_input(&path)?,
                (None, Some(set)) => {
                    let d = demo::load(set);
                    Source { columns: d.columns, rows: Value::Array(d.rows), registry: d.registry }
                }
                (None, None) => bail!("show needs --input FILE or --demo NAME"),
            };
            info!(
                columns = source.columns.len(),
                filters = filters.len(),
                sorts = sort.len(),
                "show invoked"
            );

            let mut engine =
                TableEngine::with_config(TableConfig::from_env()).with_columns(source.columns);
            engine.set_data_json(source.rows);
            if let Some(n) = page_size {
                engine.change_page_size(n)?;
            }
            if !filters.is_empty() {
                engine.apply_filter(filters.into_iter().collect());
            }
            if let Some(q) = search.as_deref() {
                engine.set_search(q);
            }
            apply_sorts(&mut engine, &sort)?;
            if !engine.go_to_page(page) {
                warn!(
                    page,
                    total_pages = engine.total_pages(),
                    "page out of range; showing page {}",
                    engine.current_page()
                );
            }

            match cli.output {
                Output::Human => println!("{}", render_table(&engine, &source.registry)),
                Output::Json => println!("{}", serde_json::to_string_pretty(&page_json(&engine))?),
            }
        }
        Commands::Columns { demo } => {
            let d = demo::load(demo);
            match cli.output {
                Output::Human => {
                    println!("KEY            TITLE          SORTABLE  FORMAT");
                    for c in &d.columns {
                        let format = format_name(&c.format);
                        println!("{:<14} {:<14} {:<9} {}", c.key, c.title, c.sortable, format);
                    }
                    if !d.filters.is_empty() {
                        println!();
                        println!("FILTER         KIND      OPTIONS");
                        for f in &d.filters {
                            let opts: Vec<&str> =
                                f.options.iter().map(|o| o.value.as_str()).collect();
                            println!("{:<14} {:<9} {}", f.key, f.kind, opts.join(","));
                        }
                    }
                }
                Output::Json => {
                    let listing = json!({ "columns": d.columns, "filters": d.filters });
                    println!("{}", serde_json::to_string_pretty(&listing)?);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_engine(set: DemoSet) -> (TableEngine, FormatterRegistry) {
        let d = demo::load(set);
        let mut engine = TableEngine::new().with_columns(d.columns);
        engine.set_data(d.rows);
        (engine, d.registry)
    }

    #[test]
    fn columns_follow_first_seen_keys() {
        let rows = json!([{ "a": 1 }, { "a": 2, "b": 3 }, "not a row"]);
        let keys: Vec<String> = columns_from_rows(&rows).into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(columns_from_rows(&Value::Null).is_empty());
    }

    #[test]
    fn nested_input_fields_become_sortable_dotted_columns() {
        let rows = json!([
            { "name": "HQ", "address": null, "addr": 1 },
            { "name": "North", "address": { "city": "Beijing", "geo": { "lat": 39.9 } } },
            { "name": "South", "address": { "city": "Anqing" }, "tags": {} },
        ]);
        let columns = columns_from_rows(&rows);
        let mut keys: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["addr", "address.city", "address.geo.lat", "name", "tags"]);

        let mut engine = TableEngine::new().with_columns(columns);
        engine.set_data_json(rows);
        apply_sorts(&mut engine, &["address.city".to_string()]).unwrap();
        let names: Vec<String> = engine.filtered_rows().map(|r| stringify(&r["name"])).collect();
        assert_eq!(names, vec!["South", "North", "HQ"]);

        let err = apply_sorts(&mut engine, &["address.zip".to_string()]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TableError>(),
            Some(&TableError::UnknownColumn("address.zip".into()))
        );
    }

    #[test]
    fn human_table_shows_indicator_and_footer() {
        let (mut engine, registry) = demo_engine(DemoSet::Departments);
        engine.sort("headcount");
        engine.sort("headcount");
        engine.change_page_size(2).unwrap();
        let out = render_table(&engine, &registry);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Headcount ↓"));
        assert!(lines[1].starts_with("Head Office"));
        assert!(lines[1].contains("1,250"));
        assert!(lines[1].contains("Enabled"));
        assert_eq!(lines[3], "Showing 1-2 of 6  page 1/3  [1] 2 3");
    }

    #[test]
    fn null_cells_use_placeholder() {
        let (mut engine, registry) = demo_engine(DemoSet::Departments);
        engine.apply_filter(FilterSet::new().with(FieldFilter::text("name", "facilities")));
        let out = render_table(&engine, &registry);
        let row = out.lines().nth(1).unwrap();
        assert!(row.contains(" - "), "{}", row);
    }

    #[test]
    fn json_page_carries_metadata_and_rows() {
        let (mut engine, _) = demo_engine(DemoSet::Dictionary);
        engine.apply_filter(FilterSet::new().with(FieldFilter::select("type", "pay_method")));
        let v = page_json(&engine);
        assert_eq!(v["page"]["total_items"], json!(3));
        assert_eq!(v["page"]["total_pages"], json!(1));
        assert_eq!(v["rows"].as_array().map(|r| r.len()), Some(3));
        assert_eq!(v["rows"][0]["value"], json!("cash"));
    }

    #[test]
    fn empty_result_prints_no_records() {
        let (mut engine, registry) = demo_engine(DemoSet::Roles);
        engine.set_search("nobody");
        let out = render_table(&engine, &registry);
        assert_eq!(out.lines().last(), Some("No records  page 1/1  "));
    }

    #[test]
    fn cli_parses_repeated_flags() {
        let cli = Cli::parse_from([
            "pmgridctl",
            "-o",
            "json",
            "show",
            "--demo",
            "roles",
            "--filter",
            "status=enabled:select",
            "--filter",
            "name=man",
            "--sort",
            "name",
            "--sort",
            "name",
            "--page-size",
            "3",
        ]);
        assert_eq!(cli.output, Output::Json);
        match cli.command {
            Commands::Show { demo, filters, sort, page, page_size, .. } => {
                assert_eq!(demo, Some(DemoSet::Roles));
                let expected = vec![
                    FieldFilter::select("status", "enabled"),
                    FieldFilter::text("name", "man"),
                ];
                assert_eq!(filters, expected);
                assert_eq!(sort, vec!["name", "name"]);
                assert_eq!(page, 1);
                assert_eq!(page_size, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

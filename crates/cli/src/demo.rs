//! Built-in demo datasets for the back office's list pages.

use clap::ValueEnum;
use pmgrid_core::prelude::*;
use serde_json::{json, Value};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DemoSet {
    Roles,
    Departments,
    Dictionary,
}

pub struct Demo {
    pub columns: Vec<ColumnSpec>,
    pub filters: Vec<FilterField>,
    pub rows: Vec<Value>,
    pub registry: FormatterRegistry,
}

fn status_format() -> CellFormat {
    CellFormat::mapped([("enabled", "Enabled"), ("disabled", "Disabled")])
}

fn status_filter() -> FilterField {
    FilterField::new("status", "Status", FilterKind::Select)
        .option("enabled", "Enabled")
        .option("disabled", "Disabled")
}

pub fn load(set: DemoSet) -> Demo {
    match set {
        DemoSet::Roles => roles(),
        DemoSet::Departments => departments(),
        DemoSet::Dictionary => dictionary(),
    }
}

/// name, code, status, comma-separated permissions, created; `""` is null.
const ROLES: [(&str, &str, &str, &str, &str); 6] = [
    ("Administrator", "admin", "enabled", "user,role,dept,dict,log", "2023-06-01 09:00:00"),
    ("Property Manager", "pm", "enabled", "house,tenant,bill", "2023-09-14 14:20:00"),
    ("Finance", "finance", "enabled", "bill,report", "2024-01-08 10:05:00"),
    ("Maintenance", "repair", "disabled", "repair", "2024-03-02 08:30:00"),
    ("Customer Service", "cs", "enabled", "tenant,complaint", "2024-03-19 16:45:00"),
    ("Auditor", "audit", "", "", ""),
];

fn or_null(s: &str) -> Value {
    if s.is_empty() { Value::Null } else { json!(s) }
}

fn role(name: &str, code: &str, status: &str, perms: &str, created: &str) -> Value {
    let perms: Vec<&str> = perms.split(',').filter(|p| !p.is_empty()).collect();
    json!({
        "name": name,
        "code": code,
        "status": or_null(status),
        "permissions": perms,
        "createdAt": or_null(created),
    })
}

fn dept(
    name: &str,
    code: &str,
    manager: Option<&str>,
    city: Option<&str>,
    headcount: u32,
    status: Option<&str>,
) -> Value {
    let address = city.map(|c| json!({ "city": c }));
    json!({
        "name": name,
        "code": code,
        "manager": manager,
        "address": address,
        "headcount": headcount,
        "status": status,
    })
}

fn roles() -> Demo {
    let mut registry = FormatterRegistry::new();
    registry.register("count", |v: &Value| match v {
        Value::Array(items) => items.len().to_string(),
        other => stringify(other),
    });
    Demo {
        columns: vec![
            col("name", "Role"),
            col("code", "Code"),
            col("status", "Status").format(status_format()),
            col("permissions", "Permissions")
                .unsortable()
                .format(CellFormat::Named { name: "count".into() }),
            col("createdAt", "Created").format(CellFormat::DateTime { pattern: "%Y-%m-%d".into() }),
        ],
        filters: vec![
            FilterField::new("name", "Role", FilterKind::Text),
            status_filter(),
            FilterField::new("createdAt", "Created", FilterKind::Date),
        ],
        rows: ROLES
            .iter()
            .map(|&(name, code, status, perms, created)| role(name, code, status, perms, created))
            .collect(),
        registry,
    }
}

fn departments() -> Demo {
    Demo {
        columns: vec![
            col("name", "Department"),
            col("code", "Code"),
            col("manager", "Manager"),
            col("address.city", "City"),
            col("headcount", "Headcount")
                .format(CellFormat::Number { decimals: 0, thousands: true }),
            col("status", "Status").format(status_format()),
        ],
        filters: vec![
            FilterField::new("name", "Department", FilterKind::Text),
            FilterField::new("address.city", "City", FilterKind::Text),
            status_filter(),
        ],
        rows: vec![
            dept("Head Office", "HQ", Some("Zhang Wei"), Some("Shanghai"), 1250, Some("enabled")),
            dept("North Region", "NR", Some("Li Na"), Some("Beijing"), 430, Some("enabled")),
            dept("South Region", "SR", Some("Chen Jie"), Some("Shenzhen"), 388, Some("enabled")),
            dept("Facilities", "FAC", None, Some("Shanghai"), 96, Some("disabled")),
            dept("West Region", "WR", Some("Wang Fang"), None, 57, Some("enabled")),
            dept("Legal", "LEG", Some("Zhao Min"), Some("Hangzhou"), 12, None),
        ],
        registry: FormatterRegistry::new(),
    }
}

fn dictionary() -> Demo {
    let entries = [
        ("house_type", "Apartment", "apartment", 1, true),
        ("house_type", "Villa", "villa", 2, true),
        ("house_type", "Shop", "shop", 3, false),
        ("pay_method", "Cash", "cash", 1, true),
        ("pay_method", "Bank transfer", "bank", 2, true),
        ("pay_method", "Card", "card", 3, true),
        ("repair_level", "Urgent", "urgent", 1, true),
        ("repair_level", "Normal", "normal", 2, true),
        ("repair_level", "Low", "low", 3, false),
    ];
    Demo {
        columns: vec![
            col("type", "Type"),
            col("label", "Label"),
            col("value", "Value"),
            col("sort", "Sort").width(60.0),
            col("enabled", "Enabled")
                .format(CellFormat::Boolean { yes: "yes".into(), no: "no".into() }),
        ],
        filters: vec![
            FilterField::new("type", "Type", FilterKind::Select)
                .option("house_type", "House type")
                .option("pay_method", "Payment method")
                .option("repair_level", "Repair level"),
            FilterField::new("label", "Label", FilterKind::Text),
        ],
        rows: entries
            .iter()
            .map(|(ty, label, value, sort, enabled)| {
                json!({
                    "type": ty,
                    "label": label,
                    "value": value,
                    "sort": sort,
                    "enabled": enabled,
                })
            })
            .collect(),
        registry: FormatterRegistry::new(),
    }
}

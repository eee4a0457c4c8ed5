use pmgrid_core::filter::{FieldFilter, FilterSet};
use pmgrid_engine::TableEngine;
use serde_json::{json, Value};
use std::time::Instant;

fn gen_row(i: usize) -> Value {
    let status = match i % 3 {
        0 => "enabled",
        1 => "disabled",
        _ => "pending",
    };
    json!({
        "id": i,
        "name": format!("unit-{i:06}"),
        "building": format!("B{}", i % 20),
        "status": status,
        "rent": (i % 5000) as f64 + 0.5,
        "createdAt": format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
        "tenant": if i % 7 == 0 { Value::Null } else { json!(format!("tenant {}", i % 1000)) },
    })
}

fn percentile_us(xs: &mut [u128], p: f64) -> u128 {
    xs.sort_unstable();
    let idx = ((xs.len() as f64 - 1.0) * p).round() as usize;
    xs[idx]
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn main() {
    let n = env_usize("PMGRID_BENCH_ROWS", 100_000);
    let iters = env_usize("PMGRID_BENCH_ITERS", 20);

    eprintln!("generating {} rows", n);
    let t0 = Instant::now();
    let rows: Vec<Value> = (0..n).map(gen_row).collect();
    let gen_ms = t0.elapsed().as_secs_f64() * 1_000.0;

    let mut engine = TableEngine::new();
    let t1 = Instant::now();
    engine.set_data(rows);
    let load_ms = t1.elapsed().as_secs_f64() * 1_000.0;
    println!("load: generate={:.1}ms set_data={:.1}ms rows={}", gen_ms, load_ms, n);

    let mut run = |label: &str, op: &mut dyn FnMut(&mut TableEngine, usize)| {
        let mut times: Vec<u128> = Vec::with_capacity(iters);
        for i in 0..iters {
            let t = Instant::now();
            op(&mut engine, i);
            times.push(t.elapsed().as_micros());
        }
        let p50 = percentile_us(&mut times.clone(), 0.50) as f64 / 1000.0;
        let p99 = percentile_us(&mut times, 0.99) as f64 / 1000.0;
        println!(
            "{}: p50={:.3}ms p99={:.3}ms ({} iters, filtered={})",
            label,
            p50,
            p99,
            iters,
            engine.filtered_len()
        );
    };

    run("filter_select", &mut |e: &mut TableEngine, i: usize| {
        let status = ["enabled", "disabled", "pending"][i % 3];
        e.apply_filter(FilterSet::new().with(FieldFilter::select("status", status)));
    });
    run("filter_text+date", &mut |e: &mut TableEngine, i: usize| {
        e.apply_filter(
            FilterSet::new()
                .with(FieldFilter::text("tenant", &format!("tenant {}", i % 10)))
                .with(FieldFilter::date("createdAt", "2024-0")),
        );
    });
    run("search", &mut |e: &mut TableEngine, i: usize| e.set_search(&format!("b{}", i % 20)));
    run("sort_cycle", &mut |e: &mut TableEngine, _: usize| {
        e.sort("rent");
    });
    run("page_walk", &mut |e: &mut TableEngine, i: usize| {
        e.go_to_page(i + 1);
        let _ = e.visible_page();
    });
}

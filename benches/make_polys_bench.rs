use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use geo_types::{LineString, Point};
use mapunit_polys::model::{ContactLine, LabelOrigin, LabelPoint};
use mapunit_polys::reconcile::reconcile;
use mapunit_polys::Polygonizer;
use serde_json::{Map, Value};

fn generate_grid(n: usize) -> Vec<LineString<f64>> {
    let mut lines = Vec::new();
    for i in 0..=n {
        lines.push(LineString::from(vec![(0.0, i as f64), (n as f64, i as f64)]));
        lines.push(LineString::from(vec![(i as f64, 0.0), (i as f64, n as f64)]));
    }
    lines
}

fn contacts(n: usize) -> Vec<ContactLine> {
    generate_grid(n)
        .into_iter()
        .enumerate()
        .map(|(i, ls)| {
            let mut attributes = Map::new();
            attributes.insert("Type".into(), Value::from("contact"));
            attributes.insert("IsConcealed".into(), Value::from("N"));
            ContactLine {
                oid: i as i64 + 1,
                id: Some(format!("CAF{}", i + 1)),
                parts: vec![ls],
                line_type: "contact".into(),
                is_concealed: false,
                attributes,
            }
        })
        .collect()
}

/// One label per cell, alternating between two units by column.
fn labels(n: usize) -> Vec<LabelPoint> {
    let mut out = Vec::with_capacity(n * n);
    for x in 0..n {
        for y in 0..n {
            let mut attributes = Map::new();
            let unit = if x % 2 == 0 { "Qal" } else { "Tb" };
            attributes.insert("MapUnit".into(), Value::from(unit));
            out.push(LabelPoint::new(
                Point::new(x as f64 + 0.5, y as f64 + 0.5),
                LabelOrigin::MapUnitPoint((x * n + y) as i64 + 1),
                attributes,
                "MapUnitPolys_ID",
            ));
        }
    }
    out
}

fn bench_polygonize(c: &mut Criterion) {
    let mut group = c.benchmark_group("polygonize");
    group.sample_size(10);

    for size in [5, 10, 20].iter() {
        group.bench_with_input(BenchmarkId::new("grid", size), size, |b, &size| {
            let lines = generate_grid(size);
            b.iter(|| {
                let mut poly = Polygonizer::new();
                // Grid lines cross without shared vertices.
                poly.node_input = true;
                for line in &lines {
                    poly.add_geometry(line.clone().into());
                }
                poly.polygonize().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    group.sample_size(10);

    for size in [5, 10, 20].iter() {
        group.bench_with_input(BenchmarkId::new("grid", size), size, |b, &size| {
            let lines = contacts(size);
            let labels = labels(size);
            b.iter(|| reconcile(&lines, &labels, 0.0).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_polygonize, bench_reconcile);
criterion_main!(benches);

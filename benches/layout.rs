use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lineage_layout::adapter::parse_tree_json;
use lineage_layout::config::Config;
use lineage_layout::events::build_events;
use lineage_layout::ir::Tree;
use lineage_layout::layout::{ViewKind, compute_layout, compute_timeline_layout};
use lineage_layout::render::render_svg;
use std::hint::black_box;

/// `generations` layers of couples, each couple with `children` kids. Every
/// third person shares a birthplace so the map view has clusters to spread.
fn synthetic_family(generations: usize, children: usize) -> String {
    let mut people = Vec::new();
    let mut links = Vec::new();
    let mut layer: Vec<usize> = Vec::new();
    let mut next = 0usize;

    let mut person = |people: &mut Vec<String>, year: usize| {
        let id = next;
        next += 1;
        let (x, y) = if id % 3 == 0 {
            (42.0, 18.0)
        } else {
            ((id * 37 % 100) as f32, (id * 53 % 100) as f32)
        };
        people.push(format!(
            r#"{{"id":"p{id}","name":"Person {id}","born":"{year}-01-01","location":"Town {}, Shire, Land","x":{x},"y":{y}}}"#,
            id % 7
        ));
        id
    };

    for _ in 0..2 {
        layer.push(person(&mut people, 1800));
    }
    for depth in 1..generations {
        let mut below = Vec::new();
        for pair in layer.chunks(2) {
            for _ in 0..children {
                let child = person(&mut people, 1800 + depth * 25);
                for parent in pair {
                    links.push(format!(r#"{{"parentId":"p{parent}","childId":"p{child}"}}"#));
                }
                below.push(child);
            }
        }
        layer = below;
    }

    format!(
        r#"{{"people":[{}],"relationships":[{}]}}"#,
        people.join(","),
        links.join(",")
    )
}

fn families() -> Vec<(String, Tree)> {
    [(3usize, 2usize), (4, 3), (5, 3)]
        .into_iter()
        .map(|(generations, children)| {
            let json = synthetic_family(generations, children);
            let tree = parse_tree_json(&json).expect("parse failed");
            (format!("gen{generations}_x{children}"), tree)
        })
        .collect()
}

fn bench_views(c: &mut Criterion) {
    let config = Config::default();
    for (group_name, kind) in [
        ("layout_tree", ViewKind::Tree),
        ("layout_map", ViewKind::Map),
        ("layout_timeline", ViewKind::Timeline),
    ] {
        let mut group = c.benchmark_group(group_name);
        for (name, tree) in families() {
            group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |b, tree| {
                b.iter(|| {
                    let layout = compute_layout(black_box(tree), kind, 1200.0, 800.0, &config);
                    black_box(layout.view_box());
                });
            });
        }
        group.finish();
    }
}

fn bench_timeline_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline_serpentine");
    let config = Config::default();
    for (name, tree) in families() {
        let events = build_events(&tree);
        group.bench_with_input(BenchmarkId::from_parameter(name), &events, |b, events| {
            b.iter(|| {
                let layout = compute_timeline_layout(black_box(events), 1200.0, &config.timeline);
                black_box(layout.cards.len());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = Config::default();
    for (name, tree) in families() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |b, tree| {
            b.iter(|| {
                for kind in [ViewKind::Tree, ViewKind::Map, ViewKind::Timeline] {
                    let layout = compute_layout(black_box(tree), kind, 1200.0, 800.0, &config);
                    black_box(render_svg(&layout, &config).len());
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_views, bench_timeline_only, bench_end_to_end);
criterion_main!(benches);

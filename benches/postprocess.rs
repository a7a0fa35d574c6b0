//! Benchmarks for export post-processing and syntax highlighting.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mermedit::diagram::{Background, ExportConfig};
use mermedit::export::svg::postprocess;
use mermedit::highlight::Highlighter;
use mermedit::templates::TEMPLATES;

fn large_svg() -> String {
    let mut svg = String::from(
        r#"<svg id="mermaid-1" width="100%" xmlns="http://www.w3.org/2000/svg" style="max-width: 2400px;" viewBox="0 0 2400 1600">"#,
    );
    for i in 0..2_000 {
        svg.push_str(&format!(
            r#"<rect x="{i}" y="10" width="40" height="20" stroke-width="1"/>"#
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn bench_postprocess(c: &mut Criterion) {
    let svg = large_svg();
    let settings = ExportConfig {
        width: Some(1920),
        height: Some(1080),
        background: Background::White,
    };

    c.bench_function("postprocess_large_svg", |b| {
        b.iter(|| postprocess(black_box(&svg), black_box(&settings)))
    });
}

fn bench_highlight_templates(c: &mut Criterion) {
    c.bench_function("highlight_templates", |b| {
        b.iter(|| {
            for template in &TEMPLATES {
                let mut highlighter = Highlighter::new();
                for line in template.source.lines() {
                    black_box(highlighter.line(black_box(line)));
                }
            }
        })
    });
}

criterion_group!(benches, bench_postprocess, bench_highlight_templates);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn synthetic_urlset(n: usize) -> String {
    let mut xml = String::with_capacity(n * 64);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    for i in 0..n {
        xml.push_str(&format!(
            "<url><loc>https://octopart.com/part/{i}</loc><lastmod>2026-01-01</lastmod></url>"
        ));
    }
    xml.push_str("</urlset>");
    xml
}

fn bench_parse(c: &mut Criterion) {
    let small = synthetic_urlset(100);
    let large = synthetic_urlset(50_000);

    c.bench_function("parse_urlset_100", |b| {
        b.iter(|| lochound::sitemap::parse(black_box(&small)))
    });
    c.bench_function("parse_urlset_50k", |b| {
        b.iter(|| lochound::sitemap::parse(black_box(&large)))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);

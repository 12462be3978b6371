//! Benchmarks for the full-rewrite writer
//!
//! - `write_pages`: documents with a growing page tree
//! - `write_stream`: a single large Flate stream

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pdf_cos::{Dictionary, Filter, LineEnding, ObjectType, PDFDocument, PDFWriter, Stream, WriterConfig};

/// Catalog, page tree and `pages` pages sharing one font resource
fn page_tree(pages: usize) -> PDFDocument {
    let mut document = PDFDocument::new();
    let font = document.add_object(Dictionary::with_type("Font"));

    let mut kids = Vec::with_capacity(pages);
    for i in 0..pages {
        let mut fonts = Dictionary::new();
        fonts.set_reference("F1", font);
        let mut resources = Dictionary::new();
        resources.set("Font", fonts);

        let content = format!("BT /F1 12 Tf 72 712 Td (Page {}) Tj ET", i);
        let mut page = Dictionary::with_type("Page");
        page.set("Resources", resources);
        page.set("Contents", Stream::new(Dictionary::new(), content.into_bytes()));
        page.set("MediaBox", [0, 0, 612, 792].map(ObjectType::from).to_vec());
        kids.push(ObjectType::Reference(document.add_object(page)));
    }

    let mut tree = Dictionary::with_type("Pages");
    tree.set("Count", pages);
    tree.set("Kids", kids);
    let mut catalog = Dictionary::with_type("Catalog");
    catalog.set("Pages", tree);
    let root = document.add_object(catalog);
    document.set_root(root);
    document
}

fn bench_write_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_pages");
    let config = WriterConfig::new().with_line_ending(LineEnding::Lf);

    for pages in [10, 100, 1000] {
        let document = page_tree(pages);
        group.bench_with_input(BenchmarkId::from_parameter(pages), &document, |b, document| {
            let mut writer = PDFWriter::with_config(config.clone());
            b.iter(|| {
                let mut output = Vec::new();
                writer.write(black_box(document), &mut output).ok();
                output
            })
        });
    }
    group.finish();
}

fn bench_write_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_stream");
    let size = 1 << 20;
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();

    let mut document = PDFDocument::new();
    let stream = match Stream::from_decoded(Dictionary::new(), &data, &[Filter::FlateDecode]) {
        Ok(stream) => stream,
        Err(e) => panic!("encoding benchmark stream: {}", e),
    };
    let mut catalog = Dictionary::with_type("Catalog");
    catalog.set("Metadata", stream);
    let root = document.add_object(catalog);
    document.set_root(root);

    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("flate_1mb", |b| {
        b.iter(|| document.to_bytes().map(|bytes| bytes.len()).unwrap_or(0))
    });
    group.finish();
}

criterion_group!(benches, bench_write_pages, bench_write_stream);
criterion_main!(benches);

use citebase_medline::extract::extract_records;
use citebase_medline::parser::parse_shard_xml;

fn load_shard(filename: &str) -> String {
    let dir = std::env::var("BENCH_DATA_DIR")
        .expect("set BENCH_DATA_DIR to directory with sample shard XML");
    let path = std::path::Path::new(&dir).join(filename);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

#[divan::bench]
fn parse_shard_xml_bench(bencher: divan::Bencher) {
    let xml = load_shard("medline_sample.xml");
    bencher.bench(|| parse_shard_xml(&xml).unwrap());
}

#[divan::bench]
fn parse_and_extract_bench(bencher: divan::Bencher) {
    let xml = load_shard("medline_sample.xml");
    bencher.bench(|| {
        let entries = parse_shard_xml(&xml).unwrap();
        extract_records(entries)
    });
}

fn main() {
    divan::main();
}

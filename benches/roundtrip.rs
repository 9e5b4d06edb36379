//! Write/read round-trip throughput for both dialects.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tabcase::{
    global_columns, row, CaseCsvReader, CaseCsvWriter, FlexTable, GlobalColumns, MatrixCsvReader,
    MatrixCsvWriter, ReadCases, TestCase, WriteCases,
};

fn sample_cases(count: usize) -> Vec<TestCase> {
    (0..count)
        .map(|i| {
            let rows = (0..10)
                .map(|j| {
                    row! {
                        "Action" => if j % 2 == 0 { "Quote" } else { "Trade" },
                        "Price" => format!("{}", 100 + j),
                        "Qty" => format!("{}", 10 * (i + 1)),
                        "Symbol" => "AAPL"
                    }
                })
                .collect();
            TestCase::new(format!("case_{i}")).with_steps(FlexTable::from(rows))
        })
        .collect()
}

fn bench_legacy_round_trip(c: &mut Criterion) {
    let cases = sample_cases(100);
    c.bench_function("legacy write+read 100 cases", |b| {
        b.iter(|| {
            let mut buffer = Vec::new();
            let mut writer = CaseCsvWriter::new(&mut buffer);
            writer.write_many(black_box(&cases)).unwrap();
            writer.close().unwrap();
            let text = String::from_utf8(buffer).unwrap();
            let read = CaseCsvReader::from_str(&text).unwrap().read_all().unwrap();
            black_box(read)
        })
    });
}

fn bench_matrix_round_trip(c: &mut Criterion) {
    let cases = sample_cases(100);
    let columns = GlobalColumns::Flat(global_columns(&cases));
    c.bench_function("matrix write+read 100 cases", |b| {
        b.iter(|| {
            let mut buffer = Vec::new();
            let mut writer = MatrixCsvWriter::new(&mut buffer, columns.clone());
            writer.write_many(black_box(&cases)).unwrap();
            writer.close().unwrap();
            let text = String::from_utf8(buffer).unwrap();
            let read = MatrixCsvReader::from_str(&text).unwrap().read_all().unwrap();
            black_box(read)
        })
    });
}

criterion_group!(benches, bench_legacy_round_trip, bench_matrix_round_trip);
criterion_main!(benches);

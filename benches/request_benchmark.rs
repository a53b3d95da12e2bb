use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fileserver::{
    handler::handle, request::Request, response::Response, router::route, FileStore, MemoryStore,
};

fn request_parse_body_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse_body");

    let json = r#"{"fileName":"note.txt","fileContent":"hello world"}"#;
    let form = "fileName=note.txt&fileContent=hello+world";
    let requests = [
        ("no_body", "GET /files/note.txt HTTP/1.1\r\nHost: localhost\r\n\r\n".to_string()),
        (
            "json",
            format!(
                "POST /create HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                json.len(),
                json
            ),
        ),
        (
            "form",
            format!(
                "POST /create HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{}",
                form.len(),
                form
            ),
        ),
    ];

    for (name, request) in requests.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), request, |b, request| {
            b.iter(|| {
                let _ = Request::try_from(black_box(request.as_bytes()), 0).unwrap();
            });
        });
    }

    group.finish();
}

fn route_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("route");

    let requests = [
        ("index", "GET / HTTP/1.1\r\n\r\n"),
        ("file", "GET /files/my%20note.txt?raw=1 HTTP/1.1\r\n\r\n"),
        ("invalid", "GET /very/long/path/that/matches/nothing HTTP/1.1\r\n\r\n"),
    ];

    for (name, raw) in requests.iter() {
        let request = Request::try_from(raw.as_bytes(), 0).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &request, |b, request| {
            b.iter(|| route(request.method(), black_box(request.path())));
        });
    }

    group.finish();
}

fn full_pipeline_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");

    for count in [10, 100, 1000].iter() {
        let store = MemoryStore::new();
        for i in 0..*count {
            store.create(&format!("file{}.txt", i), "content").unwrap();
        }
        let raw = "GET /files/file5.txt HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n";

        group.bench_with_input(BenchmarkId::from_parameter(count), &store, |b, store| {
            b.iter(|| {
                let request = Request::try_from(black_box(raw.as_bytes()), 0).unwrap();
                let route = route(request.method(), request.path());
                let outcome = handle(0, &route, &request, store);
                Response::from_outcome(&outcome, &request, 0).as_bytes()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    request_parse_body_benchmark,
    route_benchmark,
    full_pipeline_benchmark
);
criterion_main!(benches);

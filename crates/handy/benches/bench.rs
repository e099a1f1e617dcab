use bytes::Bytes;
use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use futures::stream::{FuturesUnordered, StreamExt};
use handy::{Handler, Pace, Request, Response, Status, handler_fn};
use tokio::runtime::Builder;

fn request(path: &'static str) -> Request {
    http::Request::get(path).body(Bytes::new()).unwrap()
}

fn bench_pace(c: &mut Criterion) {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();
    let worker_cases = [1, 4, 16, 64];
    let concurrency_cases = [1, 16, 256];

    for &workers in &worker_cases {
        for &concurrency in &concurrency_cases {
            let mut group = c.benchmark_group("pace/handle");
            group.throughput(Throughput::Elements(concurrency as u64));

            let pace = rt.block_on(async {
                Pace::new(
                    workers,
                    handler_fn(|req: Request| async move { Response::new(req.into_body()) }),
                )
            });

            group.bench_function(format!("workers/{workers}/conc/{concurrency}"), |b| {
                b.to_async(&rt).iter(|| {
                    let pace = pace.clone();
                    async move {
                        let mut calls: FuturesUnordered<_> = (0..concurrency)
                            .map(|_| {
                                let pace = pace.clone();
                                tokio::spawn(async move { pace.handle(request("/")).await })
                            })
                            .collect();
                        while let Some(res) = calls.next().await {
                            black_box(res.unwrap());
                        }
                    }
                });
            });

            group.finish();
        }
    }
}

fn bench_status(c: &mut Criterion) {
    let rt = Builder::new_current_thread().enable_all().build().unwrap();
    let status = Status::default();
    let paths = ["/100", "/200", "/300", "/400", "/500", "/foo", "/200/foo"];

    let mut group = c.benchmark_group("status/handle");
    group.throughput(Throughput::Elements(paths.len() as u64));
    group.bench_function("mixed", |b| {
        b.to_async(&rt).iter(|| async {
            for path in paths {
                black_box(status.handle(request(path)).await);
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_pace, bench_status);
criterion_main!(benches);

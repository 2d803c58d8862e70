use criterion::{criterion_group, criterion_main, Criterion};
use moodle_perf_runner::infra::command::{CommandExecutor, CommandSpec, ProcessExecutor};
use moodle_perf_runner::performance::extract_urls;
use tokio::runtime::Runtime;

fn bench_process_executor(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let spec = CommandSpec::new("echo").arg("bench");

    c.bench_function("process_executor_echo", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = ProcessExecutor.execute(&spec).await;
        });
    });
}

fn bench_extract_urls(c: &mut Criterion) {
    let output = (0..200)
        .map(|i| format!("Generated file: http://web1/pluginfile.php/1/tool_generator/testplan/0/plan_{i}.jmx\n"))
        .collect::<String>();

    c.bench_function("extract_urls", |b| {
        b.iter(|| extract_urls(&output).len());
    });
}

criterion_group!(benches, bench_process_executor, bench_extract_urls);
criterion_main!(benches);

use bounded_pool::{Config, Pool};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};


fn main() -> bounded_pool::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bounded_pool=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let pool = Pool::with_config(config)?;
    let counter = Arc::new(AtomicUsize::new(0));

    let now = Instant::now();
    for i in 0..100_000u64 {
        let counter = counter.clone();
        pool.submit(move || -> Result<(), String> {
            if i % 25_000 == 0 {
                return Err(format!("task {i} rejected"));
            }
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })?;
    }
    pool.wait_completion();

    let metrics = pool.metrics();
    let report = pool.shutdown(true, Duration::from_secs(10));
    println!("elapsed: {:?}", now.elapsed());
    println!(
        "done: {}, failed: {}, joined workers: {}",
        counter.load(Ordering::Relaxed),
        metrics.failed_tasks,
        report.joined.len()
    );
    Ok(())
}

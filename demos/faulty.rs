//! # Example: faulty
//!
//! Fault isolation: failing and panicking jobs are recorded on their own
//! records while healthy siblings and the dispatch loop keep going.
//!
//! Demonstrates how to:
//! - Report failure from a job body with [`JobError`].
//! - Observe a contained panic as a `faulted` record.
//! - Read fault messages from [`Engine::process_details`] and the queue log.
//!
//! ## Run
//! ```bash
//! cargo run --example faulty
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use jobq::{Engine, EngineConfig, JobError, JobStatus, JobValue};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut cfg = EngineConfig::default();
    cfg.max_concurrent = 3;
    cfg.poll_interval = Duration::from_millis(50);
    cfg.idle_backoff = Duration::from_millis(200);

    let engine = Engine::new(cfg);

    let token = CancellationToken::new();
    let loop_handle = {
        let engine = engine.clone();
        let token = token.clone();
        tokio::spawn(async move { engine.run(token).await })
    };

    // One healthy job, one that fails cleanly, one that panics.
    let healthy = engine.submit_fn("healthy", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(Some(JobValue::new(String::from("still here"))))
    });
    let failing = engine.submit_fn("failing", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Err(JobError::Failed {
            error: "upstream said no".into(),
        })
    });
    let panicking = engine.submit_fn("panicking", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if 40 + 2 == 42 {
            panic!("divided by zero, probably");
        }
        Ok(None)
    });

    // Wait until all three settled one way or another.
    let ids = [&healthy, &failing, &panicking];
    loop {
        let settled = ids
            .iter()
            .filter(|id| engine.process_details(id).status.is_terminal())
            .count();
        if settled == ids.len() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    for id in ids {
        let detail = engine.process_details(id);
        match detail.status {
            JobStatus::Faulted => {
                println!("[faulty] {} faulted: {}", id, detail.fault.unwrap_or_default())
            }
            status => println!("[faulty] {id} finished as {status}"),
        }
    }
    println!(
        "[faulty] healthy result = {:?}",
        engine.task_result::<String>(&healthy)
    );

    // The queue log keeps the fault messages alongside lifecycle entries.
    println!("[faulty] --- queue log ---");
    for entry in engine.task_log() {
        match entry.job {
            Some(id) => println!("[faulty] {id}: {}", entry.message),
            None => println!("[faulty] engine: {}", entry.message),
        }
    }

    token.cancel();
    loop_handle.await??;
    Ok(())
}

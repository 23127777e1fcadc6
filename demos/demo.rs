//! # Example: demo
//!
//! End-to-end tour of the engine: initialize, submit, poll, fetch results,
//! shut down.
//!
//! Demonstrates how to:
//! - Build an [`Engine`] with a one-shot warmup initializer.
//! - Submit closure jobs that produce typed results.
//! - Watch jobs move through their lifecycle via [`Engine::processes`].
//! - Resolve results with [`Engine::task_result`] (wrong type is just `None`).
//! - Stop the dispatch loop with a [`CancellationToken`].
//!
//! ## Flow
//! ```text
//! Engine::builder(cfg).with_initializer(warmup).build()
//!     ├─► spawn engine.run(token)          (dispatch loop)
//!     ├─► initialization_complete()        (first caller runs warmup)
//!     ├─► submit_fn("sum" | "greeting" | "silent" | "audit")
//!     ├─► poll processes() until terminal
//!     ├─► task_result::<T>(id) / process_details(id)
//!     └─► token.cancel() ──► loop drains and exits
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example demo
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use jobq::{Engine, EngineConfig, JobValue};

/// The kind of structured payload a real job would assemble.
#[derive(Clone, Debug)]
struct Report {
    rows_scanned: u64,
    verdict: &'static str,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // 1. Configuration: two slots, snappy polling for a demo.
    let mut cfg = EngineConfig::default();
    cfg.max_concurrent = 2;
    cfg.poll_interval = Duration::from_millis(50);
    cfg.idle_backoff = Duration::from_millis(200);

    // 2. Engine with a simulated warmup.
    let engine = Engine::builder(cfg)
        .with_initializer(|| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .build();

    // 3. Start the dispatch loop in the background.
    let token = CancellationToken::new();
    let loop_handle = {
        let engine = engine.clone();
        let token = token.clone();
        tokio::spawn(async move { engine.run(token).await })
    };

    // 4. Block until the warmup finished.
    engine.initialization_complete().await?;
    println!("[demo] engine ready");

    // 5. Submit a few jobs with different result shapes.
    let sum = engine.submit_fn("sum", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        Ok(Some(JobValue::new(2 + 40)))
    });
    let greeting = engine.submit_fn("greeting", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(900)).await;
        Ok(Some(JobValue::new(String::from("hello from the queue"))))
    });
    let silent = engine.submit_fn("silent", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(None)
    });
    let audit = engine.submit_fn("audit", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(600)).await;
        Ok(Some(JobValue::new(Report {
            rows_scanned: 1_048_576,
            verdict: "all clear",
        })))
    });
    println!("[demo] submitted sum={sum} greeting={greeting} silent={silent} audit={audit}");

    // 6. Watch the jobs move through their lifecycle.
    loop {
        let statuses = engine.processes();
        for s in &statuses {
            println!("[demo] {} -> {}", s.id, s.status);
        }
        if statuses.iter().all(|s| s.status.is_terminal()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    // 7. Typed result resolution.
    println!("[demo] sum             = {:?}", engine.task_result::<i32>(&sum));
    println!(
        "[demo] greeting        = {:?}",
        engine.task_result::<String>(&greeting)
    );
    println!(
        "[demo] greeting as i32 = {:?}",
        engine.task_result::<i32>(&greeting)
    );
    println!("[demo] silent          = {:?}", engine.task_result::<i32>(&silent));
    if let Some(report) = engine.task_result::<Report>(&audit) {
        println!(
            "[demo] audit scanned {} rows: {}",
            report.rows_scanned, report.verdict
        );
    }

    let detail = engine.process_details(&sum);
    println!("[demo] sum took {:?}", detail.execution_time);

    // 8. Shut down.
    token.cancel();
    loop_handle.await??;
    println!("[demo] stopped cleanly");
    Ok(())
}

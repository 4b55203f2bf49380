//! # Example: cancel_sequence
//!
//! Pausing a unit, cancelling a single queued task, then cancelling the rest.
//!
//! Demonstrates how to:
//! - Pause a unit through its [`PauseHandle`] so the worker holds after it.
//! - Cancel one queued task with [`Sequencer::cancel_one`].
//! - Cancel everything with [`Sequencer::cancel_all`]; the completion never fires.
//!
//! ## Flow
//! ```text
//! run([warmup, report, cleanup])
//!   ├─► warmup runs, then pauses the worker (paused flag set from main)
//!   ├─► main: cancel_one(report)  ─► report never runs
//!   ├─► main: resume warmup       ─► cleanup runs ─► on_success()
//!   │
//! run([slow, never])
//!   └─► main: cancel_all()        ─► registry empty, pool closed, no callback
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example cancel_sequence
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskline::{
    CompletionFn, RunTarget, Sequencer, SequencerConfig, Subscribe, TaskError, TaskFn,
};

fn sequencer(label: &'static str) -> anyhow::Result<Sequencer> {
    // Optional: add subscriber to see events (requires "logging" feature)
    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(taskline::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    Ok(Sequencer::builder(SequencerConfig::default().with_label(label))
        .with_subscribers(subs)
        .build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== cancel_sequence example ===\n");

    // 1. Pause + cancel_one
    let seq = sequencer("pausing")?;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<bool>();
    let err_tx = tx.clone();
    seq.set_completion(CompletionFn::new(
        move || {
            let _ = tx.send(true);
        },
        move || {
            let _ = err_tx.send(false);
        },
    ));

    let warmup = TaskFn::arc("warmup", || {
        std::thread::sleep(Duration::from_millis(100));
        Ok::<_, TaskError>("warm")
    });
    let report = TaskFn::arc("report", || Ok::<_, TaskError>("report"));
    let cleanup = TaskFn::arc("cleanup", || Ok::<_, TaskError>("clean"));
    seq.enqueue(warmup.clone(), RunTarget::Background)
        .enqueue(report.clone(), RunTarget::Foreground)
        .enqueue(cleanup.clone(), RunTarget::Background);
    seq.try_run()?;

    if let Some(pause) = warmup.pause_handle() {
        pause.set_paused(true);
        println!("[main] warmup paused, in flight: {}", seq.in_flight());

        println!("[main] cancel report: {}", seq.cancel_one(&report));
        tokio::time::sleep(Duration::from_millis(300)).await;

        println!("[main] resuming");
        pause.set_paused(false);
    }
    println!("[main] outcome: success={:?}", rx.recv().await);
    println!("[main] report result: {:?}", report.result());
    println!("[main] cleanup result: {:?}\n", cleanup.result());

    // 2. cancel_all
    let seq = sequencer("cancelling")?;
    let slow = TaskFn::arc("slow", || {
        std::thread::sleep(Duration::from_millis(500));
        Ok::<_, TaskError>(())
    });
    let never = TaskFn::arc("never", || Ok::<_, TaskError>(()));
    seq.enqueue(slow, RunTarget::Background)
        .enqueue(never.clone(), RunTarget::Background);
    seq.try_run()?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    seq.cancel_all();
    println!(
        "[main] after cancel_all: in flight={} closed={} run()={}",
        seq.in_flight(),
        seq.is_closed(),
        seq.run()
    );

    tokio::time::sleep(Duration::from_millis(600)).await;
    println!("[main] never result: {:?}", never.result());
    Ok(())
}

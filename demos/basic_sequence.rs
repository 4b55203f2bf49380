//! # Example: basic_sequence
//!
//! Three tasks, one of them on the foreground, with the built-in [`LogWriter`].
//!
//! Demonstrates how to:
//! - Define tasks with [`TaskFn`] and pick a [`RunTarget`] per task.
//! - Gate a task with a condition.
//! - Wait for the single [`Completion`] callback and inspect per-task outcomes.
//!
//! ## Flow
//! ```text
//! enqueue(fetch, Background) ─► enqueue(render, Foreground) ─► enqueue(upload, Background)
//!                                                                 └─► attach_condition(online?)
//! run()
//!   ├─► worker: fetch.execute()           ─► post set_result to foreground
//!   ├─► worker: post render.execute()     ─► wait until the foreground ran it
//!   ├─► worker: online? false             ─► upload skipped
//!   └─► registry empty                    ─► on_success() on the foreground
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_sequence --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use taskline::{
    CompletionFn, LogWriter, RunTarget, Sequencer, SequencerConfig, Subscribe, TaskError, TaskFn,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Sequencer with a stdout event printer
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let seq = Sequencer::builder(SequencerConfig::default().with_label("basic"))
        .with_subscribers(subs)
        .build()?;

    // 2. Terminal callback, forwarded to this task
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<&'static str>();
    let err_tx = tx.clone();
    seq.set_completion(CompletionFn::new(
        move || {
            let _ = tx.send("success");
        },
        move || {
            let _ = err_tx.send("error");
        },
    ));

    // 3. Tasks
    let fetch = TaskFn::arc("fetch", || {
        std::thread::sleep(std::time::Duration::from_millis(200));
        Ok::<_, TaskError>(vec![3_u32, 1, 2])
    });
    let render = TaskFn::arc("render", || {
        let thread = std::thread::current();
        Ok::<_, TaskError>(format!("rendered on {:?}", thread.name()))
    });
    let online = Arc::new(AtomicBool::new(false));
    let upload = TaskFn::arc("upload", || Ok::<_, TaskError>(()));

    seq.enqueue(fetch.clone(), RunTarget::Background)
        .enqueue(render.clone(), RunTarget::Foreground)
        .enqueue(upload.clone(), RunTarget::Background)
        .attach_condition({
            let online = Arc::clone(&online);
            move || online.load(Ordering::SeqCst)
        })?;

    // 4. Run and wait for the outcome
    seq.try_run()?;
    let outcome = rx.recv().await.unwrap_or("sequencer dropped");

    println!("outcome: {outcome}");
    println!("fetch:   {:?}", fetch.result());
    println!("render:  {:?}", render.result());
    println!("upload:  {:?} (skipped)", upload.result());

    // Let the logger flush the last events.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    Ok(())
}

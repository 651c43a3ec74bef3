use std::rc::Rc;
use std::time::Duration;

use retainer_core::domain::LoaderStatus;
use retainer_core::impls::{MemoryHost, StreamLoad, TaskLoad, TokioDispatcher};
use retainer_core::ports::{Dispatcher, FnObserver, Observer, ScopeHost};
use retainer_core::{ScopeBuilder, Teardown};
use tokio::sync::Notify;
use tokio::task::LocalSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOOKUP_KEY: u32 = 1;
const TICKS_KEY: u32 = 2;

/// Simulated work duration, from `RETAINER_DEMO_DELAY_MS`.
fn demo_delay() -> Duration {
    let millis = std::env::var("RETAINER_DEMO_DELAY_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(200);
    Duration::from_millis(millis)
}

/// Observer that prints every callback under `label` and signals `done` on
/// completion.
fn printer<T: std::fmt::Debug + 'static>(label: &'static str, done: &Rc<Notify>) -> Rc<dyn Observer<T>> {
    let done = Rc::clone(done);
    Rc::new(
        FnObserver::new()
            .with_start(move || println!("[{label}] started"))
            .with_result(move |v: &T| println!("[{label}] result: {v:?}"))
            .with_complete(move || {
                println!("[{label}] complete");
                done.notify_one();
            }),
    )
}

fn print_status(label: &str, status: Option<LoaderStatus>) -> Result<(), serde_json::Error> {
    match status {
        Some(status) => println!("{label}: {}", serde_json::to_string(&status)?),
        None => println!("{label}: no loader"),
    }
    Ok(())
}

async fn run(delay: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let host: Rc<dyn ScopeHost> = Rc::new(MemoryHost::new());
    let dispatcher: Rc<dyn Dispatcher> = Rc::new(TokioDispatcher::new());
    let builder = || {
        ScopeBuilder::new()
            .host(Rc::clone(&host))
            .dispatcher(Rc::clone(&dispatcher))
    };

    // (A) First scope instance starts a slow lookup.
    let scope = builder().build()?;
    let done = Rc::new(Notify::new());
    let lookup = scope.loader_manager().get_or_create(
        LOOKUP_KEY,
        || {
            TaskLoad::new(move |token| {
                let step = Duration::from_millis(10);
                let mut waited = Duration::ZERO;
                while waited < delay {
                    if token.is_cancelled() {
                        return String::from("cancelled");
                    }
                    std::thread::sleep(step);
                    waited += step;
                }
                String::from("hello from the blocking pool")
            })
        },
        Some(printer("screen 1", &done)),
    )?;
    lookup.start()?;

    // (B) The scope is torn down while the lookup is in flight.
    scope.finish(Teardown::Transient);
    print_status("after transient teardown", Some(lookup.status()))?;

    // (C) The recreated scope finds the same loader and picks up its result.
    let scope = builder().build()?;
    let manager = scope.loader_manager();
    manager.get_or_create(LOOKUP_KEY, || TaskLoad::new(|_| String::new()), Some(printer("screen 2", &done)))?;
    done.notified().await;
    print_status("lookup", manager.status(LOOKUP_KEY))?;

    // (D) A stream loader delivers several results before completing.
    let ticks_done = Rc::new(Notify::new());
    let ticks = manager.get_or_create(
        TICKS_KEY,
        || {
            StreamLoad::new(move || {
                futures::stream::unfold(0u32, move |n| async move {
                    if n == 3 {
                        return None;
                    }
                    tokio::time::sleep(delay / 4).await;
                    Some((Ok::<_, String>(n), n + 1))
                })
            })
        },
        Some(printer("ticks", &ticks_done)),
    )?;
    ticks.start()?;
    ticks_done.notified().await;
    print_status("ticks", manager.status(TICKS_KEY))?;

    // (E) Leaving for good destroys every loader.
    scope.finish(Teardown::Permanent);
    info!(
        lookup_destroyed = lookup.is_destroyed(),
        ticks_destroyed = ticks.is_destroyed(),
        "demo finished"
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let delay = demo_delay();
    info!(delay_ms = delay.as_millis() as u64, "starting retainer demo");
    LocalSet::new().run_until(run(delay)).await
}

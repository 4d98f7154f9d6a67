//! Hello-world for looper: two greeters and a goodbye that stops the loop.
//!
//! Run with `RUST_LOG=trace` to watch the enqueue/dispatch flow.

use looper::{Callback, EventLoop};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let event_loop = EventLoop::with_name("hello-world");
    event_loop
        .start(|lp| {
            // This entry hook runs on the loop thread: the place to create
            // emitters and register callbacks.
            let emitter = lp.emitter().expect("loop is running");

            let hello = Callback::new(|who: &String| println!("Hello, {who}!"));
            emitter.on("greet", &hello).expect("on the loop thread");

            // Multiple callbacks per event fire in registration order.
            let again = Callback::new(|who: &String| println!("Hello again, {who}!"));
            emitter.on("greet", &again).expect("on the loop thread");

            let leave = {
                let lp = lp.clone();
                Callback::new(move |who: &String| {
                    println!("Goodbye, {who}!");
                    lp.quit().expect("loop is running");
                })
            };
            emitter.on("leave", &leave).expect("on the loop thread");

            // emit is legal from any thread; these are dispatched once the
            // hook returns.
            emitter
                .emit("greet", "world".to_string())
                .expect("loop is running");
            emitter
                .emit("leave", "everyone".to_string())
                .expect("loop is running");
        })
        .expect("fresh loop");

    event_loop.join().expect("loop thread did not panic");
}

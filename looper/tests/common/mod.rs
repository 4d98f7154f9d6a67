use std::sync::mpsc;
use std::time::Duration;

use looper::{Emitter, EventLoop};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Start a loop whose entry hook hands a bound emitter back to the test
/// thread. Registration still has to happen on the loop thread; this is for
/// tests that drive `emit` (or expect rejections) from outside it.
pub fn started_loop() -> (EventLoop, Emitter) {
    let event_loop = EventLoop::new();
    let (tx, rx) = mpsc::channel();
    event_loop
        .start(move |lp| {
            let emitter = lp.emitter().expect("loop is running");
            tx.send(emitter).expect("test thread is waiting");
        })
        .expect("fresh loop");
    let emitter = rx.recv_timeout(TIMEOUT).expect("entry hook ran");
    (event_loop, emitter)
}

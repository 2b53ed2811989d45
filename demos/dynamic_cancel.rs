use periodic_timer::prelude::*;

use std::thread;
use std::thread::park_timeout;
use std::time::Duration;

// cargo run --package periodic_timer --example dynamic_cancel

fn main() {
    let timer = PeriodicTimer::new();
    timer
        .start_duration_timer(Duration::from_millis(250), |signal, elapsed| {
            println!("{:?} after {:?}", signal, elapsed);
            true
        })
        .unwrap();

    // A canceller travels to wherever the stop decision is made.
    let canceller = timer.canceller();
    thread::spawn(move || {
        park_timeout(Duration::from_secs(2));
        canceller.cancel().unwrap();
    });

    park_timeout(Duration::from_secs(3));
    dbg!(timer.is_armed());
}

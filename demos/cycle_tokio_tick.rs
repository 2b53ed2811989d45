use periodic_timer::prelude::*;

use std::thread::{current, park, Thread};
use std::time::Duration;

// cargo run --example=cycle_tokio_tick

fn main() {
    let timer = PeriodicTimerBuilder::default()
        .tokio_reactor_by_default()
        .build();

    let main_thread: Thread = current();
    let mut remaining = 10;
    timer
        .start_duration_timer(Duration::from_millis(500), move |signal, elapsed| {
            println!("tick: {:?} after {:?}", signal, elapsed);

            remaining -= 1;
            if remaining == 0 {
                println!("bye bye");
                main_thread.unpark();
            }
            remaining > 0
        })
        .unwrap();

    park();
}

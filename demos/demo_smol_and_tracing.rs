use periodic_timer::prelude::*;

use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[async_std::main]
async fn main() -> AnyResult<()> {
    // a builder for `FmtSubscriber`.
    FmtSubscriber::builder()
        // all spans/events with a level higher than TRACE (e.g, debug, info, warn, etc.)
        // will be written to stdout.
        .with_max_level(Level::TRACE)
        // completes the builder.
        .init();

    let timer = PeriodicTimerBuilder::default()
        .smol_reactor_by_default()
        .build();

    let mut beat = 0;
    timer.start_timepoint_timer(Duration::from_millis(300), move |_signal, elapsed| {
        beat += 1;
        info!("beat {} after {:?}", beat, elapsed);
        beat < 10
    })?;

    info!("==== The heartbeat is armed! ====");
    async_std::task::sleep(Duration::from_secs(4)).await;
    Ok(())
}

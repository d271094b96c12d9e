use embassy_time::{Duration, Ticker};

use crate::hw;
use crate::status::{self, Snapshot};

use super::SharedSupervisor;

/// Loop cadence; comfortably under the 50 ms debounce sampling interval.
const POLL_PERIOD_MS: u64 = 10;

#[embassy_executor::task]
pub async fn run(supervisor: &'static SharedSupervisor) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));

    loop {
        ticker.next().await;
        let now = hw::now();

        let snapshot = supervisor.lock(|cell| {
            let mut supervisor = cell.borrow_mut();
            supervisor.tick(now);
            Snapshot {
                powered: supervisor.is_powered(),
                ignition_on: supervisor.ignition().is_on(),
                phase: supervisor.watchdog_phase().to_raw(),
            }
        });

        let previous = status::publish(snapshot);
        if previous.powered != snapshot.powered {
            defmt::info!(
                "power {}",
                if snapshot.powered { "on" } else { "off" }
            );
        }
        if previous.ignition_on != snapshot.ignition_on {
            defmt::info!(
                "ignition latched {}",
                if snapshot.ignition_on { "on" } else { "off" }
            );
        }
        if previous.phase != snapshot.phase {
            defmt::info!("watchdog phase {}", snapshot.phase);
        }
    }
}

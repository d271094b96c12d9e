use core::cell::RefCell;

use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;

use supervisor_core::config::SupervisorConfig;
use supervisor_core::supervisor::Supervisor;

use crate::hw::{IgnitionPin, RelayOutput};

mod bus_task;
mod poll_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// The one supervisor instance, shared between the polling loop and the bus
/// task. Both contexts take the critical section for the duration of a single
/// tick or delivery.
pub(super) type SharedSupervisor =
    Mutex<CriticalSectionRawMutex, RefCell<Supervisor<RelayOutput, IgnitionPin>>>;

static SUPERVISOR: StaticCell<SharedSupervisor> = StaticCell::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let hal_config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA4,
        PB0,
        PB1,
        USART5,
        ..
    } = hal::init(hal_config);

    // Relay idles high: board unpowered until the sequencer decides otherwise.
    let relay = RelayOutput::new(Output::new(PA4, Level::High, Speed::Low));
    let ignition = IgnitionPin::new(Input::new(PA0, Pull::Down));

    let config = SupervisorConfig::new();
    defmt::info!(
        "ignition supervisor up, bus address {}",
        config.bus_address
    );

    let supervisor: &'static SharedSupervisor = SUPERVISOR.init(Mutex::new(RefCell::new(
        Supervisor::new(config, relay, ignition),
    )));

    spawner
        .spawn(poll_task::run(supervisor))
        .expect("failed to spawn polling task");
    spawner
        .spawn(bus_task::run(supervisor, USART5, PB0, PB1))
        .expect("failed to spawn bus task");

    core::future::pending::<()>().await;
}

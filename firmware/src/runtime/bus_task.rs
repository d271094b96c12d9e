use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embedded_io_async::{Read, Write};

use supervisor_core::protocol::FRAME_TERMINATOR;

use crate::hw;

use super::SharedSupervisor;

const HOST_UART_BAUD: u32 = 115_200;
const BUS_BUFFER_SIZE: usize = 64;

static mut UART_TX_BUFFER: [u8; BUS_BUFFER_SIZE] = [0; BUS_BUFFER_SIZE];
static mut UART_RX_BUFFER: [u8; BUS_BUFFER_SIZE] = [0; BUS_BUFFER_SIZE];

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART3_4_5_6_LPUART1 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART5>;
});

#[embassy_executor::task]
pub async fn run(
    supervisor: &'static SharedSupervisor,
    usart: Peri<'static, hal::peripherals::USART5>,
    tx_pin: Peri<'static, hal::peripherals::PB0>,
    rx_pin: Peri<'static, hal::peripherals::PB1>,
) -> ! {
    let mut config = UartConfig::default();
    config.baudrate = HOST_UART_BAUD;
    config.data_bits = DataBits::DataBits8;
    config.stop_bits = StopBits::STOP1;
    config.parity = Parity::ParityNone;

    let uart = unsafe {
        BufferedUart::new(
            usart,
            rx_pin,
            tx_pin,
            &mut UART_TX_BUFFER,
            &mut UART_RX_BUFFER,
            UartIrqs,
            config,
        )
        .expect("failed to initialize host bus UART")
    };

    let (mut uart_tx, mut uart_rx) = uart.split();

    let mut ingress = [0u8; BUS_BUFFER_SIZE];
    loop {
        match uart_rx.read(&mut ingress).await {
            Ok(count) if count > 0 => {
                let chunk = &ingress[..count];

                // One read burst is one delivery event. A burst that ends in
                // the frame terminator stands in for the master's response
                // read, so exactly one fill follows it.
                let response = supervisor.lock(|cell| {
                    let mut supervisor = cell.borrow_mut();
                    supervisor.handle_receive(chunk);
                    if chunk.last() == Some(&FRAME_TERMINATOR) {
                        Some(supervisor.handle_fill(hw::now()))
                    } else {
                        None
                    }
                });

                if let Some(frame) = response {
                    if frame[0] != 0 {
                        defmt::warn!("bus: protocol error {}", frame[0]);
                    }
                    if uart_tx.write_all(&frame).await.is_err() {
                        defmt::warn!("bus: UART write error");
                        continue;
                    }
                    if uart_tx.flush().await.is_err() {
                        defmt::warn!("bus: UART flush error");
                    }
                }
            }
            Ok(_) => {}
            Err(_) => {
                defmt::warn!("bus: UART read error");
            }
        }
    }
}

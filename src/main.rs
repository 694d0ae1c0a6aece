//! Trackpoint bring-up firmware for HT32F165x boards.
//!
//! Requests a report every few milliseconds, runs the pointing task on a
//! 1 ms SysTick and logs the resulting mouse reports over RTT. The matrix
//! and USB host live in the keyboard firmware; here the buttons read as
//! released and reports only go to the log.
//!
//! Build with `--features embedded` (Yoda II) or
//! `--features test-board` (HT32 test board).

#![no_std]
#![no_main]

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m_rt::{entry, exception};
use defmt_rtt as _;
use panic_probe as _;

use yoda_trackpoint::ht32::{self, Board, I2cBus, Irq};
use yoda_trackpoint::{
    Clock, HostTransport, LedIndicator, MatrixScan, MouseReport, NoIndicator, PointingTask,
    ScrollMode, Trackpoint,
};

#[cfg(not(feature = "test-board"))]
const BOARD: Board = Board::YodaII;
#[cfg(feature = "test-board")]
const BOARD: Board = Board::TestBoard;

/// Time between report requests.
const REQUEST_INTERVAL_MS: u32 = 10;

static TRACKPOINT: Trackpoint = Trackpoint::new(BOARD.config());

/// Stand-in for the keyboard: no matrix, reports go to the log.
struct RttHost {
    now_ms: u32,
}

impl MatrixScan for RttHost {
    fn get_row(&mut self, _row: u8) -> u8 {
        0
    }
}

impl HostTransport for RttHost {
    fn send_mouse(&mut self, report: &MouseReport) {
        defmt::info!("mouse {}", report);
    }
}

impl ScrollMode for RttHost {}

impl Clock for RttHost {
    fn now_ms(&self) -> u32 {
        self.now_ms
    }
}

#[entry]
fn main() -> ! {
    let mut cp = defmt::unwrap!(cortex_m::Peripherals::take());
    defmt::info!("yoda-trackpoint on {}", BOARD);

    let mut hw = defmt::unwrap!(ht32::init(BOARD, &mut cp.NVIC));

    let mut syst = cp.SYST;
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(ht32::AHB_HZ / 1_000 - 1);
    syst.clear_current();
    syst.enable_counter();

    let mut task = PointingTask::new(TRACKPOINT.config());
    task.set_debug(cfg!(debug_assertions));
    let mut host = RttHost { now_ms: 0 };
    let mut next_request = 0u32;

    loop {
        if !syst.has_wrapped() {
            continue;
        }
        host.now_ms = host.now_ms.wrapping_add(1);

        task.run_once(TRACKPOINT.slot(), &mut host);

        if host.now_ms.wrapping_sub(next_request) < u32::MAX / 2 {
            next_request = host.now_ms.wrapping_add(REQUEST_INTERVAL_MS);
            if let Err(e) = TRACKPOINT.request(&mut hw.request, 0) {
                defmt::warn!("request failed: {}", e);
            }
        }
    }
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    let unit = TRACKPOINT.config().unit;
    if irqn as u16 != Irq::for_unit(unit).number() {
        return;
    }

    let mut bus = I2cBus::new(unit);
    match BOARD.fault_led() {
        Some(led) => TRACKPOINT.on_interrupt(&mut bus, &mut LedIndicator(led)),
        None => TRACKPOINT.on_interrupt(&mut bus, &mut NoIndicator),
    }
}

//! Pointing task: turns published trackpoint reports into mouse reports.
//!
//! Runs once per polling cycle from the main loop. Raw deltas are
//! accumulated, scaled down by the board's gain, and sent either as
//! pointer motion or, while the keyboard is in scroll mode, as wheel and
//! pan. In pointer mode sub-unit remainders stay in the accumulators so
//! slow movement is not lost; a scroll step clears both accumulators.

use crate::config::{ButtonMap, Gain, TrackpointConfig};
use crate::hid::MouseReport;
use crate::report::{RawReport, ReportSlot};

/// Keyboard matrix, as far as the trackpoint buttons are concerned.
pub trait MatrixScan {
    /// Current bits of matrix row `row`.
    fn get_row(&mut self, row: u8) -> u8;
}

/// Link to the host.
pub trait HostTransport {
    fn send_mouse(&mut self, report: &MouseReport);
}

/// Whether trackpoint motion should scroll instead of moving the pointer.
pub trait ScrollMode {
    fn is_scrolling(&self) -> bool {
        false
    }
}

/// Millisecond timestamp source.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Largest magnitude a relative mouse axis carries.
const AXIS_LIMIT: i32 = 127;

fn saturate(value: i32) -> i8 {
    value.clamp(-AXIS_LIMIT, AXIS_LIMIT) as i8
}

fn flush(acc: &mut i16, gain: Gain, sent: i8) {
    let remaining = *acc as i32 - gain.consumed(sent as i32);
    *acc = remaining.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
}

/// Accumulator state of the pointing task.
pub struct PointingTask {
    motion_gain: Gain,
    scroll_gain: Gain,
    buttons: ButtonMap,
    ax: i16,
    ay: i16,
    last: MouseReport,
    debug: bool,
}

impl PointingTask {
    pub fn new(config: &TrackpointConfig) -> Self {
        Self {
            motion_gain: config.motion_gain,
            scroll_gain: config.scroll_gain,
            buttons: config.buttons,
            ax: 0,
            ay: 0,
            last: MouseReport::empty(),
            debug: false,
        }
    }

    /// Dump every nonzero raw report at debug level.
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    /// Accumulated `(x, y)` not yet sent to the host.
    pub fn accumulated(&self) -> (i16, i16) {
        (self.ax, self.ay)
    }

    /// Last report handed to the host.
    pub fn last_report(&self) -> &MouseReport {
        &self.last
    }

    /// One polling cycle. Returns the report sent, if any.
    pub fn run_once<K>(&mut self, slot: &ReportSlot, kb: &mut K) -> Option<MouseReport>
    where
        K: MatrixScan + HostTransport + ScrollMode + Clock,
    {
        let raw = slot.take();
        let buttons = self.buttons.buttons(kb.get_row(self.buttons.row()), &raw);

        if !raw.is_zero() {
            if self.debug {
                self.dump(&raw, kb.now_ms());
            }
            self.ax = self.ax.saturating_add(raw.dx() as i16);
            self.ay = self.ay.saturating_sub(raw.dy() as i16);
        }

        let mx = self.motion_gain.scale(self.ax);
        let my = self.motion_gain.scale(self.ay);
        let sx = self.scroll_gain.scale(self.ax);
        let sy = self.scroll_gain.scale(self.ay);

        let moved = mx != 0 || my != 0;
        let scrolled = sx != 0 || sy != 0;
        if !moved && !scrolled && buttons == self.last.buttons {
            return None;
        }

        let mut report = MouseReport {
            buttons,
            ..MouseReport::empty()
        };
        let scrolling = kb.is_scrolling();
        if scrolling && scrolled {
            report.v = saturate(-sy);
            report.h = saturate(sx);
            self.ax = 0;
            self.ay = 0;
        } else if !scrolling && moved {
            report.x = saturate(mx);
            report.y = saturate(my);
            flush(&mut self.ax, self.motion_gain, report.x);
            flush(&mut self.ay, self.motion_gain, report.y);
        }

        trace!(
            "mouse buttons={} x={} y={} v={} h={}",
            report.buttons,
            report.x,
            report.y,
            report.v,
            report.h
        );
        kb.send_mouse(&report);
        self.last = report;
        Some(report)
    }

    fn dump(&self, raw: &RawReport, now_ms: u32) {
        debug!(
            "trackpoint {} ms: status={} dx={} dy={} acc=({}, {})",
            now_ms,
            raw.status(),
            raw.dx(),
            raw.dy(),
            self.ax,
            self.ay
        );
    }
}

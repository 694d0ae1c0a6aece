//! HID report types handed to the host transport.

pub mod mouse;


pub use mouse::MouseReport;

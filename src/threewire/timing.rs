use std::time::{
	Duration,
	Instant,
};

// DS1302 datasheet hold times (2V column, the worst case)
pub const CE_TO_CLOCK_SETUP: Duration = Duration::from_nanos(1000); // tCC
pub const DATA_SETUP: Duration = Duration::from_nanos(50); // tDC
pub const CLOCK_HIGH: Duration = Duration::from_nanos(70); // tCH
pub const CLOCK_LOW: Duration = Duration::from_nanos(250); // tCL
pub const READ_LOW_HOLD: Duration = Duration::from_nanos(100); // tCDD

/// Hold strategy between line-level changes.
///
/// The engine calls this between every edge; a deployment on real lines
/// wants `SpinDelay`, a simulated chip can use `NoDelay`.
pub trait Delay {
	fn delay(&mut self, duration: Duration);
}

/// Busy-wait on the monotonic clock.
///
/// The protocol holds are well below scheduler granularity, so
/// `thread::sleep` would stretch every bit to milliseconds; spinning
/// keeps a burst transfer in the microsecond range.
pub struct SpinDelay;

impl Delay for SpinDelay {
	fn delay(&mut self, duration: Duration) {
		let start = Instant::now();
		while start.elapsed() < duration {}
	}
}

/// No waiting at all. Only valid against a chip double that reacts to
/// edges instead of real time.
pub struct NoDelay;

impl Delay for NoDelay {
	fn delay(&mut self, _duration: Duration) {}
}

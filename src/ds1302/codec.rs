//! Translation between normalized wall-clock time and the chip's BCD
//! register image.
//!
//! The raw image is the seven clock registers in chip order: seconds,
//! minutes, hours, day-of-month, month, weekday, year. Each register
//! is two packed decimal digits, plus per-register flag bits that the
//! masks below strip off.

use std::fmt;
use std::str;

const CLOCK_HALT_BIT: u8 = 0x80; // seconds register
const HOUR_12_BIT: u8 = 0x80; // hours register: legacy 12-hour layout
const HOUR_PM_BIT: u8 = 0x20;

/// How the hours register is laid out. Fixed per deployment; the raw
/// byte is ambiguous between the two, so this is never inferred from
/// data.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HourMode {
	/// Plain BCD 0-23. The default.
	Hour24,
	/// Legacy layout: bit 7 flags the mode, bit 5 is AM/PM, the low
	/// five bits are BCD 1-12.
	Hour12,
}

/// Normalized calendar time, `struct tm` conventions: month and
/// weekday are zero-based, year counts from 1900.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ClockTime {
	pub seconds: u8, // 0-59
	pub minutes: u8, // 0-59
	pub hours: u8, // 0-23
	pub day: u8, // day of month, 1-31
	pub month: u8, // 0-11
	pub weekday: u8, // 0-6, 0 = Sunday
	pub year: u16, // years since 1900; the chip covers 100-199 (2000-2099)
}

impl ClockTime {
	/// Validate every field against the encodable range. `encode`
	/// calls this, so no out-of-range value ever turns into wrong BCD
	/// on the chip.
	pub fn check(&self) -> crate::AResult<()> {
		ensure!(self.seconds <= 59, "seconds out of range: {}", self.seconds);
		ensure!(self.minutes <= 59, "minutes out of range: {}", self.minutes);
		ensure!(self.hours <= 23, "hours out of range: {}", self.hours);
		ensure!(self.month <= 11, "month out of range: {}", self.month);
		ensure!(self.weekday <= 6, "weekday out of range: {}", self.weekday);
		ensure!(
			self.year >= 100 && self.year <= 199,
			"year {} outside the chip's 2000-2099 range",
			1900 + self.year
		);
		let days = days_in_month(1900 + self.year, self.month);
		ensure!(
			self.day >= 1 && self.day <= days,
			"day {} out of range for month {}",
			self.day,
			self.month + 1
		);
		Ok(())
	}
}

impl fmt::Display for ClockTime {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{:04}-{:02}-{:02} {:02}:{:02}:{:02} ({})",
			1900 + self.year,
			self.month + 1,
			self.day,
			self.hours,
			self.minutes,
			self.seconds,
			WEEKDAY_NAMES[self.weekday as usize % 7],
		)
	}
}

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

impl str::FromStr for ClockTime {
	type Err = ::failure::Error;

	/// `YYYY-MM-DD HH:MM:SS` (a `T` date/time separator works too).
	/// The weekday is derived from the date, so callers can't store an
	/// inconsistent one.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		let b = s.as_bytes();
		ensure!(b.len() == 19, "expected YYYY-MM-DD HH:MM:SS, got {:?}", s);
		ensure!(
			b[4] == b'-' && b[7] == b'-' && (b[10] == b' ' || b[10] == b'T')
				&& b[13] == b':' && b[16] == b':',
			"expected YYYY-MM-DD HH:MM:SS, got {:?}",
			s
		);

		let year: u16 = s[0..4].parse()?;
		let month: u8 = s[5..7].parse()?;
		let day: u8 = s[8..10].parse()?;
		let hours: u8 = s[11..13].parse()?;
		let minutes: u8 = s[14..16].parse()?;
		let seconds: u8 = s[17..19].parse()?;

		ensure!(year >= 1900, "year {} predates the epoch", year);
		ensure!(month >= 1 && month <= 12, "month out of range: {}", month);

		let time = ClockTime {
			seconds,
			minutes,
			hours,
			day,
			month: month - 1,
			weekday: day_of_week(year, month, day),
			year: year - 1900,
		};
		time.check()?;
		Ok(time)
	}
}

fn leap_year(year: u16) -> bool {
	(year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
	match month {
		1 => if leap_year(year) { 29 } else { 28 },
		3 | 5 | 8 | 10 => 30,
		_ => 31,
	}
}

// Sakamoto's method; 0 = Sunday. `month` is 1-based here.
fn day_of_week(year: u16, month: u8, day: u8) -> u8 {
	const OFFSET: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
	let y = if month < 3 { year - 1 } else { year };
	((y + y / 4 - y / 100 + y / 400 + OFFSET[month as usize - 1] + day as u16) % 7) as u8
}

fn from_bcd(byte: u8) -> u8 {
	(byte >> 4) * 10 + (byte & 0x0f)
}

fn to_bcd(value: u8) -> u8 {
	(value / 10) << 4 | (value % 10)
}

/// Decode the raw register image. Flag bits are masked, month and
/// weekday are shifted from the chip's one-based conventions, the
/// two-digit year lands on the 2000 century.
///
/// Garbage registers decode to garbage values; the protocol has no way
/// to tell a wrong byte from a right one.
pub fn decode(raw: &[u8; 7], mode: HourMode) -> ClockTime {
	let hours = match mode {
		HourMode::Hour24 => from_bcd(raw[2] & 0x3f),
		HourMode::Hour12 => {
			let pm = (raw[2] & HOUR_PM_BIT != 0) as u8;
			(12 * pm + from_bcd(raw[2] & 0x1f)).saturating_sub(1)
		},
	};
	ClockTime {
		seconds: from_bcd(raw[0] & !CLOCK_HALT_BIT),
		minutes: from_bcd(raw[1] & 0x7f),
		hours,
		day: from_bcd(raw[3] & 0x3f),
		month: from_bcd(raw[4] & 0x1f).saturating_sub(1),
		weekday: (raw[5] & 0x07).saturating_sub(1),
		year: 100 + from_bcd(raw[6]) as u16,
	}
}

/// Encode to the raw register image; inverse of `decode`.
///
/// Rejects out-of-range fields up front instead of emitting wrong BCD.
/// The clock-halt flag is written cleared, so setting the time also
/// starts a stopped oscillator.
pub fn encode(time: &ClockTime, mode: HourMode) -> crate::AResult<[u8; 7]> {
	time.check()?;
	let hours = match mode {
		HourMode::Hour24 => to_bcd(time.hours),
		HourMode::Hour12 => {
			let pm = time.hours / 12;
			HOUR_12_BIT | pm << 5 | to_bcd(time.hours % 12 + 1)
		},
	};
	Ok([
		to_bcd(time.seconds),
		to_bcd(time.minutes),
		hours,
		to_bcd(time.day),
		to_bcd(time.month + 1),
		time.weekday + 1,
		to_bcd((time.year - 100) as u8),
	])
}

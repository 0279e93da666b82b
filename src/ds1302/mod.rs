//! DS1302 clock registers and the read/set-time surface.
//!
//! The chip side is just the seven BCD calendar registers, a
//! write-protect register, and a burst address covering all of them;
//! everything interesting happens in `codec` and in the three-wire
//! engine underneath.

use std::sync::{
	Mutex,
	MutexGuard,
};

use crate::gpio::{
	self,
	Line,
	SysfsLine,
};
use crate::threewire::{
	Bus,
	Delay,
	SpinDelay,
};

pub mod codec;

pub use self::codec::{
	ClockTime,
	HourMode,
};

#[allow(dead_code)]
mod consts {
	// write command bytes; bit 0 set turns them into reads
	pub const SECONDS: u8 = 0x80;
	pub const MINUTES: u8 = 0x82;
	pub const HOURS: u8 = 0x84;
	pub const DATE: u8 = 0x86;
	pub const MONTH: u8 = 0x88;
	pub const WEEKDAY: u8 = 0x8a;
	pub const YEAR: u8 = 0x8c;
	pub const WRITE_PROTECT: u8 = 0x8e;
	pub const TRICKLE_CHARGE: u8 = 0x90;
	pub const CLOCK_BURST: u8 = 0xbe;

	pub const WRITE_PROTECT_BIT: u8 = 0x80;

	/// A burst covers the seven calendar registers plus write-protect.
	pub const BURST_LEN: usize = 8;

	/// Calendar registers in chip order, the order burst transfers use.
	pub const CALENDAR: [u8; 7] = [SECONDS, MINUTES, HOURS, DATE, MONTH, WEEKDAY, YEAR];
}

use self::consts::*;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
	/// Move all calendar registers in one burst transaction instead of
	/// seven discrete ones. Fixed at open time.
	pub burst: bool,
	pub hour_mode: HourMode,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			burst: false,
			hour_mode: HourMode::Hour24,
		}
	}
}

/// One bound DS1302. The bus sits behind a mutex so concurrent
/// callers queue per transaction instead of interleaving bit-level
/// operations.
pub struct Ds1302<L: Line, D: Delay> {
	bus: Mutex<Bus<L, D>>,
	config: Config,
}

/// Bind a chip: establish bus idle and clear the write-protect bit if
/// it is set, so later `set_time` calls actually stick.
pub fn open<L: Line, D: Delay>(
	chip_enable: L,
	clock: L,
	data: L,
	delay: D,
	config: Config,
) -> crate::AResult<Ds1302<L, D>> {
	let mut bus = Bus::new(chip_enable, clock, data, delay)?;
	clear_write_protect(&mut bus)?;
	Ok(Ds1302 {
		bus: Mutex::new(bus),
		config,
	})
}

/// Bind a chip through three sysfs GPIO lines, with real datasheet
/// hold times.
pub fn open_sysfs(
	chip_enable: u32,
	clock: u32,
	data: u32,
	config: Config,
) -> crate::AResult<Ds1302<SysfsLine, SpinDelay>> {
	open(
		gpio::open_line(chip_enable)?,
		gpio::open_line(clock)?,
		gpio::open_line(data)?,
		SpinDelay,
		config,
	)
}

/// Read the guard bit and only write when it is set; clearing an
/// already-clear chip must not issue a write transaction.
fn clear_write_protect<L: Line, D: Delay>(bus: &mut Bus<L, D>) -> crate::AResult<()> {
	let wp = bus.read_byte(WRITE_PROTECT)?;
	if wp & WRITE_PROTECT_BIT != 0 {
		debug!("write-protect set (0x{:02x}), clearing", wp);
		bus.write_byte(WRITE_PROTECT, 0x00)?;
	}
	Ok(())
}

impl<L: Line, D: Delay> Ds1302<L, D> {
	fn lock(&self) -> crate::AResult<MutexGuard<Bus<L, D>>> {
		match self.bus.lock() {
			Ok(bus) => Ok(bus),
			Err(_) => bail!("three-wire bus poisoned by an earlier panic"),
		}
	}

	pub fn read_time(&self) -> crate::AResult<ClockTime> {
		let mut raw = [0u8; 7];
		{
			let mut bus = self.lock()?;
			if self.config.burst {
				let mut buf = [0u8; BURST_LEN];
				bus.read(CLOCK_BURST, &mut buf)?;
				raw.copy_from_slice(&buf[..7]);
			} else {
				for (target, addr) in raw.iter_mut().zip(CALENDAR.iter()) {
					*target = bus.read_byte(*addr)?;
				}
			}
		}
		debug!("raw calendar registers: {:02x?}", raw);
		Ok(codec::decode(&raw, self.config.hour_mode))
	}

	pub fn set_time(&self, time: &ClockTime) -> crate::AResult<()> {
		let raw = codec::encode(time, self.config.hour_mode)?;
		debug!("setting {} -> {:02x?}", time, raw);
		let mut bus = self.lock()?;
		if self.config.burst {
			let mut buf = [0u8; BURST_LEN];
			buf[..7].copy_from_slice(&raw);
			// trailing byte lands on the write-protect register; zero
			// keeps the chip writable
			bus.write(CLOCK_BURST, &buf)?;
		} else {
			for (addr, value) in CALENDAR.iter().zip(raw.iter()) {
				bus.write_byte(*addr, *value)?;
			}
		}
		Ok(())
	}

	/// Raw discrete dump of the eight named clock registers.
	pub fn dump(&self) -> crate::AResult<[(&'static str, u8); 8]> {
		let mut bus = self.lock()?;
		Ok([
			("seconds", bus.read_byte(SECONDS)?),
			("minutes", bus.read_byte(MINUTES)?),
			("hours", bus.read_byte(HOURS)?),
			("date", bus.read_byte(DATE)?),
			("month", bus.read_byte(MONTH)?),
			("weekday", bus.read_byte(WEEKDAY)?),
			("year", bus.read_byte(YEAR)?),
			("write-protect", bus.read_byte(WRITE_PROTECT)?),
		])
	}
}

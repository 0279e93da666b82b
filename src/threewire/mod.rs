//! Bit-banged engine for the DS1302 three-wire interface.
//!
//! Sometimes described as SPI, but it isn't: there is a single
//! bidirectional DATA pin that switches from output to input in the
//! middle of a read transaction, and the chip-enable pin is active
//! high.
//!
//! A transaction is: raise CE, shift out one command byte, then either
//! shift out data bytes (write) or flip DATA around and shift data
//! bytes in (read), then drop CE. Everything is LSB-first. The chip
//! samples DATA on the rising CLK edge and presents output bits on the
//! falling edge, valid until the next falling edge, so a reader samples
//! right after raising CLK.
//!
//! Command byte framing: bit 7 always set, bit 6 selects RAM (not used
//! here) versus the clock registers, bits 5-1 the register index,
//! bit 0 the transfer direction. Register index 31 addresses all clock
//! registers as one burst.
//!
//! There is no acknowledge signal anywhere; the only failures at this
//! layer are the GPIO accesses themselves.

mod timing;

#[cfg(test)]
pub(crate) mod sim;

pub use self::timing::{
	Delay,
	NoDelay,
	SpinDelay,
};

use crate::gpio::{
	Direction,
	Line,
};

use self::timing::{
	CE_TO_CLOCK_SETUP,
	CLOCK_HIGH,
	CLOCK_LOW,
	DATA_SETUP,
	READ_LOW_HOLD,
};

/// Direction flag in the command byte; set for reads.
pub const READ_BIT: u8 = 0x01;

/// Exclusive owner of the three lines and the hold strategy.
///
/// Bus idle is CE low, CLK low, DATA configured output and driven low;
/// `new` establishes it and every transaction restores it, also on
/// error paths.
pub struct Bus<L: Line, D: Delay> {
	chip_enable: L,
	clock: L,
	data: L,
	delay: D,
}

impl<L: Line, D: Delay> Bus<L, D> {
	pub fn new(chip_enable: L, clock: L, data: L, delay: D) -> crate::AResult<Self> {
		let mut bus = Bus {
			chip_enable,
			clock,
			data,
			delay,
		};
		bus.idle()?;
		Ok(bus)
	}

	fn idle(&mut self) -> crate::AResult<()> {
		self.data.set_direction(Direction::Output)?;
		self.data.set_value(false)?;
		self.clock.set_value(false)?;
		self.chip_enable.set_value(false)?;
		Ok(())
	}

	/// Start a transaction: enter the bus from idle and shift out the
	/// already-framed command byte.
	pub fn begin(&mut self, command: u8) -> crate::AResult<Transaction<L, D>> {
		let mut tx = Transaction { bus: self };
		tx.bus.data.set_direction(Direction::Output)?;
		tx.bus.data.set_value(false)?;
		tx.bus.clock.set_value(false)?;
		tx.bus.chip_enable.set_value(true)?;
		// CE to first clock edge is a hard lower bound (tCC)
		tx.bus.delay.delay(CE_TO_CLOCK_SETUP);
		tx.send_byte(command)?;
		Ok(tx)
	}

	pub fn write(&mut self, command: u8, data: &[u8]) -> crate::AResult<()> {
		let command = command & !READ_BIT;
		debug!("three-wire write 0x{:02x}: {:02x?}", command, data);
		let mut tx = self.begin(command)?;
		for b in data {
			tx.send_byte(*b)?;
		}
		Ok(())
	}

	pub fn write_byte(&mut self, command: u8, value: u8) -> crate::AResult<()> {
		self.write(command, &[value])
	}

	pub fn read(&mut self, command: u8, target: &mut [u8]) -> crate::AResult<()> {
		let command = command | READ_BIT;
		let tx = self.begin(command)?;
		let mut tx = tx.start_receive()?;
		for t in target.iter_mut() {
			*t = tx.receive_byte()?;
		}
		drop(tx);
		debug!("three-wire read 0x{:02x}: {:02x?}", command, target);
		Ok(())
	}

	pub fn read_byte(&mut self, command: u8) -> crate::AResult<u8> {
		let mut buf = [0u8];
		self.read(command, &mut buf)?;
		Ok(buf[0])
	}
}

/// Open transaction in the output phase. Dropping it returns the bus
/// to idle, whether or not the transfer got anywhere.
pub struct Transaction<'a, L: Line + 'a, D: Delay + 'a> {
	bus: &'a mut Bus<L, D>,
}

impl<'a, L: Line, D: Delay> Transaction<'a, L, D> {
	/// Shift one byte out, LSB first, with the four-phase per-bit
	/// timing: drive, setup hold, CLK up, high hold, CLK down, low
	/// hold. The chip samples on the rising edge.
	pub fn send_byte(&mut self, byte: u8) -> crate::AResult<()> {
		for bit in 0..8 {
			self.bus.data.set_value(byte & (1 << bit) != 0)?;
			self.bus.delay.delay(DATA_SETUP);
			self.bus.clock.set_value(true)?;
			self.bus.delay.delay(CLOCK_HIGH);
			self.bus.clock.set_value(false)?;
			self.bus.delay.delay(CLOCK_LOW);
		}
		Ok(())
	}

	/// Turn DATA around for the input phase of a read transaction.
	pub fn start_receive(mut self) -> crate::AResult<ReadTransaction<'a, L, D>> {
		self.bus.data.set_direction(Direction::Input)?;
		Ok(ReadTransaction(self))
	}
}

impl<'a, L: Line, D: Delay> Drop for Transaction<'a, L, D> {
	fn drop(&mut self) {
		let _ = self.bus.idle();
	}
}

/// Input phase of a read transaction; DATA is an input until drop.
pub struct ReadTransaction<'a, L: Line + 'a, D: Delay + 'a>(Transaction<'a, L, D>);

impl<'a, L: Line, D: Delay> ReadTransaction<'a, L, D> {
	/// Shift one byte in, LSB first, sampling right after the rising
	/// CLK edge.
	pub fn receive_byte(&mut self) -> crate::AResult<u8> {
		let bus = &mut *self.0.bus;
		let mut byte = 0u8;
		for bit in 0..8 {
			bus.clock.set_value(false)?;
			bus.delay.delay(READ_LOW_HOLD);
			bus.clock.set_value(true)?;
			if bus.data.get_value()? {
				byte |= 1 << bit;
			}
		}
		Ok(byte)
	}
}

//! Deterministic DS1302 double for protocol-level tests.
//!
//! Three `SimLine`s share one chip state; the chip decodes the
//! bit-banged protocol edge by edge, so the tests exercise the real
//! engine against the behavior the datasheet describes instead of a
//! canned byte sequence.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::gpio::{
	Direction,
	Line,
};

const WRITE_PROTECT_REG: usize = 7;

pub struct SimState {
	/// Clock registers: seconds, minutes, hours, date, month, weekday,
	/// year, write-protect.
	pub regs: [u8; 8],
	/// CE rising edges seen.
	pub transactions: u32,
	/// Register writes that actually committed, in order.
	pub write_log: Vec<(usize, u8)>,
	/// Every master-driven bit sampled on a rising CLK edge.
	pub driven_bits: Vec<bool>,
	/// Completed command bytes.
	pub commands: Vec<u8>,

	ce: bool,
	clock: bool,
	data_dir: Direction,
	data_master: bool,
	out_bit: bool,
	bit_count: u32,
	command: u8,
	shift: u8,
	byte_index: usize,
}

impl SimState {
	pub fn is_idle(&self) -> bool {
		!self.ce && !self.clock && self.data_dir == Direction::Output && !self.data_master
	}

	fn command_reg(&self) -> usize {
		((self.command >> 1) & 0x1f) as usize
	}

	fn is_burst(&self) -> bool {
		self.command_reg() == 0x1f
	}

	fn on_ce_rise(&mut self) {
		self.transactions += 1;
		self.bit_count = 0;
		self.command = 0;
		self.shift = 0;
		self.byte_index = 0;
		self.out_bit = false;
	}

	fn on_clock_rise(&mut self) {
		if !self.ce {
			return;
		}
		let k = self.bit_count;
		self.bit_count += 1;

		if k < 8 {
			assert_eq!(self.data_dir, Direction::Output, "command bits must be master-driven");
			self.driven_bits.push(self.data_master);
			if self.data_master {
				self.command |= 1 << k;
			}
			if k == 7 {
				assert_eq!(self.command & 0xc0, 0x80, "bad command framing: 0x{:02x}", self.command);
				self.commands.push(self.command);
			}
			return;
		}

		let k = k - 8;
		if self.command & 0x01 != 0 {
			// read: chip output for this bit, valid right after the edge
			self.out_bit = self.output_bit(k);
		} else {
			assert_eq!(self.data_dir, Direction::Output, "write bits must be master-driven");
			self.driven_bits.push(self.data_master);
			if self.data_master {
				self.shift |= 1 << (k % 8);
			}
			if k % 8 == 7 {
				self.commit_byte();
			}
		}
	}

	fn output_bit(&self, k: u32) -> bool {
		let reg = if self.is_burst() {
			(k as usize / 8) % 8
		} else {
			self.command_reg()
		};
		assert!(reg < 8, "RAM registers are not modeled");
		self.regs[reg] >> (k % 8) & 1 != 0
	}

	fn commit_byte(&mut self) {
		let reg = if self.is_burst() {
			self.byte_index % 8
		} else {
			self.command_reg()
		};
		assert!(reg < 8, "RAM registers are not modeled");
		let value = self.shift;
		self.shift = 0;
		self.byte_index += 1;

		// the write-protect bit gates everything except itself
		if self.regs[WRITE_PROTECT_REG] & 0x80 != 0 && reg != WRITE_PROTECT_REG {
			return;
		}
		self.regs[reg] = value;
		self.write_log.push((reg, value));
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Role {
	ChipEnable,
	Clock,
	Data,
}

pub struct SimLine {
	chip: Rc<RefCell<SimState>>,
	role: Role,
}

impl Line for SimLine {
	fn set_direction(&mut self, direction: Direction) -> io::Result<()> {
		let mut chip = self.chip.borrow_mut();
		if self.role == Role::Data {
			chip.data_dir = direction;
			if direction == Direction::Output {
				chip.data_master = false;
			}
		}
		Ok(())
	}

	fn set_value(&mut self, value: bool) -> io::Result<()> {
		let mut chip = self.chip.borrow_mut();
		match self.role {
			Role::ChipEnable => {
				if value && !chip.ce {
					chip.on_ce_rise();
				}
				chip.ce = value;
			},
			Role::Clock => {
				let rising = value && !chip.clock;
				chip.clock = value;
				if rising {
					chip.on_clock_rise();
				}
			},
			Role::Data => {
				assert_eq!(chip.data_dir, Direction::Output, "driving DATA while it is an input");
				chip.data_master = value;
			},
		}
		Ok(())
	}

	fn get_value(&mut self) -> io::Result<bool> {
		let chip = self.chip.borrow();
		assert_eq!(self.role, Role::Data, "only DATA is readable");
		assert_eq!(chip.data_dir, Direction::Input, "sampling DATA while it is an output");
		Ok(chip.out_bit)
	}
}

/// Fresh chip with zeroed registers and the three lines wired to it.
pub fn new_chip() -> (Rc<RefCell<SimState>>, SimLine, SimLine, SimLine) {
	let chip = Rc::new(RefCell::new(SimState {
		regs: [0; 8],
		transactions: 0,
		write_log: Vec::new(),
		driven_bits: Vec::new(),
		commands: Vec::new(),
		ce: false,
		clock: false,
		data_dir: Direction::Output,
		data_master: false,
		out_bit: false,
		bit_count: 0,
		command: 0,
		shift: 0,
		byte_index: 0,
	}));
	let line = |role| SimLine {
		chip: chip.clone(),
		role,
	};
	(
		chip.clone(),
		line(Role::ChipEnable),
		line(Role::Clock),
		line(Role::Data),
	)
}

use std::io;

mod linux;

pub use self::linux::{
	open_line,
	SysfsLine,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Input,
	Output,
}

/// One digital signal line, direction-switchable.
///
/// Switching to `Output` must leave the line driven low until `set_value`
/// says otherwise; the three-wire engine relies on that for the bus idle
/// state.
pub trait Line {
	fn set_direction(&mut self, direction: Direction) -> io::Result<()>;

	/// Drive a level; only meaningful while the line is an output.
	fn set_value(&mut self, value: bool) -> io::Result<()>;

	/// Sample the level; only meaningful while the line is an input.
	fn get_value(&mut self) -> io::Result<bool>;
}

impl<'a, L: ?Sized + Line> Line for &'a mut L {
	fn set_direction(&mut self, direction: Direction) -> io::Result<()> {
		L::set_direction(*self, direction)
	}

	fn set_value(&mut self, value: bool) -> io::Result<()> {
		L::set_value(*self, value)
	}

	fn get_value(&mut self) -> io::Result<bool> {
		L::get_value(*self)
	}
}

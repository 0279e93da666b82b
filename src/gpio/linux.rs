use std::fs;
use std::io::{
	self,
	Write,
};
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use super::Direction;

const SYSFS_GPIO: &str = "/sys/class/gpio";

pub struct SysfsLine {
	number: u32,
	base: PathBuf,
	value: fs::File,
}

fn export(number: u32) -> io::Result<()> {
	let mut f = fs::OpenOptions::new()
		.write(true)
		.open(format!("{}/export", SYSFS_GPIO))?;
	match f.write_all(number.to_string().as_bytes()) {
		// EBUSY: line already exported, which is fine for us
		Err(ref e) if e.raw_os_error() == Some(libc::EBUSY) => Ok(()),
		r => r,
	}
}

fn unexport(number: u32) -> io::Result<()> {
	let mut f = fs::OpenOptions::new()
		.write(true)
		.open(format!("{}/unexport", SYSFS_GPIO))?;
	f.write_all(number.to_string().as_bytes())
}

/// Export a GPIO through sysfs and claim it as an output driven low.
pub fn open_line(number: u32) -> crate::AResult<SysfsLine> {
	with_context!(("GPIO {}", number), {
		export(number)?;

		let base = PathBuf::from(format!("{}/gpio{}", SYSFS_GPIO, number));

		// "low" configures output direction and level in one write, so
		// the line never glitches high while we claim it
		fs::OpenOptions::new()
			.write(true)
			.open(base.join("direction"))?
			.write_all(b"low")?;

		let value = fs::OpenOptions::new()
			.read(true)
			.write(true)
			.open(base.join("value"))?;

		Ok(SysfsLine {
			number,
			base,
			value,
		})
	})
}

impl SysfsLine {
	pub fn number(&self) -> u32 {
		self.number
	}

	fn write_direction(&self, keyword: &[u8]) -> io::Result<()> {
		fs::OpenOptions::new()
			.write(true)
			.open(self.base.join("direction"))?
			.write_all(keyword)
	}
}

impl super::Line for SysfsLine {
	fn set_direction(&mut self, direction: Direction) -> io::Result<()> {
		match direction {
			Direction::Input => self.write_direction(b"in"),
			Direction::Output => self.write_direction(b"low"),
		}
	}

	fn set_value(&mut self, value: bool) -> io::Result<()> {
		let buf: &[u8] = if value { b"1" } else { b"0" };
		let l = self.value.write_at(buf, 0)?;
		if l != 1 {
			return Err(io::Error::new(io::ErrorKind::Other, "short write to GPIO value"));
		}
		Ok(())
	}

	fn get_value(&mut self) -> io::Result<bool> {
		let mut buf = [0u8; 1];
		let l = self.value.read_at(&mut buf, 0)?;
		if l != 1 {
			return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "empty read from GPIO value"));
		}
		Ok(buf[0] == b'1')
	}
}

impl Drop for SysfsLine {
	fn drop(&mut self) {
		let _ = unexport(self.number);
	}
}

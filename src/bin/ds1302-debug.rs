#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate ds1302_gpio;
use ds1302_gpio::*;

use std::process::exit;

use ds1302_gpio::ds1302::{
	Config,
	HourMode,
};

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (clap::App::new("ds1302-debug"))
		(version: crate_version!())
		(about: "Dump the raw DS1302 clock registers")
		(@arg ce: --ce +takes_value +required "GPIO number of the chip-enable line")
		(@arg clk: --clk +takes_value +required "GPIO number of the clock line")
		(@arg data: --data +takes_value +required "GPIO number of the data line")
		(@arg hour12: --hour12 "Decode hours using the legacy 12-hour layout")
	).get_matches();

	let config = Config {
		burst: false,
		hour_mode: if matches.is_present("hour12") {
			HourMode::Hour12
		} else {
			HourMode::Hour24
		},
	};

	let rtc = ds1302::open_sysfs(
		get_param(&matches, "ce")?,
		get_param(&matches, "clk")?,
		get_param(&matches, "data")?,
		config,
	)?;

	for (name, value) in rtc.dump()?.iter() {
		println!("{:14} 0x{:02x}", name, value);
	}
	println!();
	println!("decoded: {}", rtc.read_time()?);

	Ok(())
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}

use clap::Parser;
use hue_controller::cli::{self, Cli};
use std::io;
use std::process;

fn configure_logging(level: u8) {
	let level = match level {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};

	let env = env_logger::Env::default().default_filter_or(level);
	let _ = env_logger::Builder::from_env(env)
		.format_target(false)
		.format_timestamp(None)
		.try_init();
}

fn main() {
	let cli = Cli::parse();
	configure_logging(cli.verbose);

	let stdout = io::stdout();
	let mut out = stdout.lock();
	if let Err(err) = cli::run(&cli, &mut out) {
		eprintln!("error: {}", err);
		process::exit(err.exit_code());
	}
}

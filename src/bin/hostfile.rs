use std::io;
use std::process;

use clap::Parser;

use runserver_on_hostname::{run, Args, CommandError, Settings};

fn main() {
    env_logger::init();

    let args = Args::parse();
    let stdout = io::stdout();
    let stderr = io::stderr();

    let result = Settings::from_env()
        .map_err(CommandError::from)
        .and_then(|settings| run(&args, &settings, &mut stdout.lock(), &mut stderr.lock()));

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(e.exit_code());
    }
}

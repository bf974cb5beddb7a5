use std::env::args_os;
use std::path::PathBuf;

use runserver_on_hostname::{host_file, load_hostfile, FormatMode};

fn main() {
    let path = match args_os().nth(1) {
        Some(p) => PathBuf::from(p),
        None => match host_file() {
            Ok(p) => p,
            Err(e) => {
                println!("No host table available: {}", e);
                return;
            }
        },
    };

    println!("Loading host table from {}", path.display());
    println!("");

    let table = match load_hostfile(&path) {
        Ok(t) => t,
        Err(e) => {
            println!("Failed to load host table: {}", e);
            return;
        }
    };

    println!("{:?}", table);
    println!("");
    println!("{}", table.format(FormatMode::Simple));
    println!("");

    for name in &table {
        for (line, ip) in table.lines_for(name).iter().zip(table.ips_for(name)) {
            println!("  {:<20} points to {:<16} (line {})", name, ip, line);
        }
    }
}

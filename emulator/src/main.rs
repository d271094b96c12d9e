mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use session::Session;

fn main() -> io::Result<()> {
    let debug_mode = parse_debug_flag().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: supervisor-emulator [--debug]");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(debug_mode);
    let mut line = String::new();

    writeln!(
        writer,
        "Ignition supervisor emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_line(trimmed) {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_debug_flag() -> Result<bool, String> {
    let mut debug_mode = false;
    for arg in env::args().skip(1) {
        if arg == "--debug" {
            debug_mode = true;
        } else {
            return Err(format!("Unknown argument `{arg}`"));
        }
    }
    Ok(debug_mode)
}

use step_checker::Session;
use std::io::{BufRead, BufReader};

/// Read a line of working per line of stdin, checking each one against the
/// line before it.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut session = Session::new();
    let stdin = std::io::stdin();

    println!("Starting from {}", session.previous());

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        session.set_current(line.as_str());
        let report = session.check();

        match report.hint {
            Some(hint) => println!("{}: {} ({})", line, report.verdict, hint),
            None => println!("{}: {}", line, report.verdict),
        }

        if let Some(latex) = session.checker().render_display(&line) {
            println!("  {}", latex);
        }

        for (key, value) in &report.diagnostics {
            log::debug!("{}: {}", key, value);
        }

        session.next_step();
    }

    println!("Checked {} steps", session.history().len());

    Ok(())
}

use anyhow::Context;
use gradesd::{ipc, settings};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let settings = settings::Settings::from_env().context("invalid gradesd environment")?;
    settings::init_tracing(&settings);
    info!(version = env!("CARGO_PKG_VERSION"), "gradesd ready");

    let mut state = ipc::AppState::new(settings);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                warn!(error = %e, "unparsable request line");
                ipc::bad_json(e.to_string())
            }
        };

        writeln!(stdout, "{}", resp).context("write response")?;
        stdout.flush().context("flush response")?;
    }

    info!(requests = state.requests_handled, "gradesd shutting down");
    Ok(())
}

use crate::tee::Tee;
use agent::{Orchestrator, Result, SharedWriter};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const RESULT_BANNER: &str = "=== RESULTADO FINAL ===";
pub const ERROR_BANNER: &str = "=== ERROR ===";

/// One log per second of wall-clock time; two runs started within the same
/// second share a name.
pub fn log_filename(started: &DateTime<Local>) -> String {
    format!("crewai_log_{}.txt", started.format("%Y%m%d_%H%M%S"))
}

/// The current directory is left implicit so the banner shows the bare name.
fn log_path(log_dir: &Path, name: &str) -> PathBuf {
    if log_dir == Path::new(".") {
        PathBuf::from(name)
    } else {
        log_dir.join(name)
    }
}

/// Runs the orchestrator with everything it writes mirrored to a fresh log
/// file in `log_dir`, then reports the outcome on both.
///
/// A failed run is reported, not returned: only errors creating or writing
/// the log come back as `Err`. The console handle is never replaced, so
/// once this returns nothing written to it reaches the log.
pub async fn run(
    console: &SharedWriter,
    log_dir: &Path,
    orchestrator: &mut impl Orchestrator,
    started: DateTime<Local>,
) -> Result<PathBuf> {
    let path = log_path(log_dir, &log_filename(&started));
    let mut console = console.clone();
    writeln!(console, "Guardando log en: {}", path.display())?;

    {
        let log_file = File::create(&path)?;
        let mut out = SharedWriter::new(Tee::new(vec![
            Box::new(console.clone()) as Box<dyn Write + Send>,
            Box::new(log_file),
        ]));

        let outcome = orchestrator.kickoff(out.clone()).await;
        report(&mut out, outcome)?;
    }

    writeln!(console, "\nLog guardado en: {}", path.display())?;
    Ok(path)
}

fn report(out: &mut impl Write, outcome: Result<String>) -> io::Result<()> {
    match outcome {
        Ok(result) => {
            writeln!(out, "\n{}", RESULT_BANNER)?;
            writeln!(out, "{}", result)?;
        }
        Err(err) => {
            tracing::error!(error = %err, "crew run failed");
            writeln!(out, "\n{}", ERROR_BANNER)?;
            writeln!(out, "Error durante la ejecución: {}", err)?;
        }
    }
    out.flush()
}

use anyhow::Result;
use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;
use std::path::Path;

fn builder() -> Builder {
    Builder::from_env(Env::default().default_filter_or("info"))
}

/// Log to stderr. Used by the non-interactive subcommands.
pub fn init_stderr() {
    let _ = builder().target(Target::Stderr).try_init();
}

/// Log to `path`, appending. The terminal belongs to the dashboard while it
/// runs, so nothing may be written to stderr.
pub fn init_file(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = builder().target(Target::Pipe(Box::new(file))).try_init();
    Ok(())
}

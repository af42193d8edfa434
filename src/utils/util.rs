use crate::error::VcxResult;
use std::{fmt::Display, path::Path, sync::Once};

pub type Result<T> = VcxResult<T>;

#[allow(unused)]
static INIT_LOG: Once = Once::new();

#[allow(unused)]
pub fn init_logger() {
    INIT_LOG.call_once(|| {
        env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .is_test(true)
            .init();
    });
}

pub fn handle_error_and_exit(err: impl Display) -> ! {
    log::error!("{err}");
    std::process::exit(1);
}

pub fn try_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(crate::vcx_error!(
            "Path/File does not exist: {}",
            path.display()
        ));
    }
    Ok(())
}

/// Normalises a host-supplied CPU count; zero and negative values mean one
/// worker.
pub fn clamp_workers(num_cpu: i64) -> usize {
    if num_cpu <= 0 { 1 } else { num_cpu as usize }
}

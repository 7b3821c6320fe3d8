//! Host environment utility functions

use std::path::PathBuf;

/// Get the root directory of the ASV software installation.
///
/// The root is given by the `ASV_SW_ROOT` environment variable, which must
/// be set before any executable is run. Parameter files and session
/// directories are resolved relative to this root.
pub fn get_asv_sw_root() -> Result<PathBuf, std::env::VarError> {
    Ok(PathBuf::from(std::env::var("ASV_SW_ROOT")?))
}

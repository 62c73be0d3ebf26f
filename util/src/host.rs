//! Host platform (linux for example) utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "LINACT_SW_ROOT";

/// Get the software root directory from the environment.
///
/// The root contains the `params` directory and is where session directories
/// are created.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Short description of the platform this executable was built for.
pub fn platform() -> String {
    format!("{} ({})", env::consts::OS, env::consts::ARCH)
}

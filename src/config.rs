//! Configuration loading helpers.
//!
//! Sub-command arguments are layered as defaults < `.effconf.toml` (or the
//! file named by `EFFCONF_CONFIG_PATH`) < `EFFCONF_CMDS_<SUB>_*` environment
//! variables < command-line flags. The file uses one `[cmds.<sub>]` table per
//! sub-command.

use figment::error::{Error as FigmentError, Kind as FigmentKind};
use log::debug;
use ortho_config::{OrthoConfig, OrthoError, load_and_merge_subcommand_for};

fn missing_field(err: &FigmentError, field: &str) -> bool {
    // FigmentError yields its causes only by value.
    err.clone()
        .into_iter()
        .any(|e| matches!(e.kind, FigmentKind::MissingField(ref f) if f == field))
}

/// Load configuration for `cli_args`, falling back to the command-line values
/// when the only problem is that `field` is absent from every source.
///
/// # Errors
///
/// Returns an [`OrthoError`] if configuration gathering fails for any other
/// reason, such as an unreadable or malformed configuration file.
#[expect(
    clippy::result_large_err,
    reason = "configuration loading errors can be verbose"
)]
pub fn load_with_fallback<T>(cli_args: T, field: &str) -> Result<T, OrthoError>
where
    T: OrthoConfig + serde::Serialize + Default + clap::CommandFactory + Clone,
{
    match load_and_merge_subcommand_for::<T>(&cli_args) {
        Ok(merged) => Ok(merged),
        Err(OrthoError::Gathering(e)) if missing_field(&e, field) => {
            debug!("configuration sources omit '{field}'; using command-line values");
            Ok(cli_args)
        }
        Err(e) => Err(e),
    }
}

use log::debug;
use std::process::Command;

/// Log an external command at debug level before it runs.
///
/// Keeps every ffmpeg/ffprobe invocation reconstructable from a debug log
/// without echoing it to the operator at normal verbosity.
pub fn log_command(cmd: &Command) {
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    debug!(
        "Running command: {} {}",
        cmd.get_program().to_string_lossy(),
        args.join(" ")
    );
}

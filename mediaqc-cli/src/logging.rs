use log::LevelFilter;

/// Initialize the logger for the mediaqc CLI.
///
/// Progress reaches the operator through the terminal event handler, so
/// the log default stays at warnings; `--verbose` opens up debug output
/// including every engine command line.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter(None, level)
        .parse_default_env()
        .init();
}

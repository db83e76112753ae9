use std::process::ExitCode;

fn main() -> ExitCode {
    kurbanlink_cli::run()
}

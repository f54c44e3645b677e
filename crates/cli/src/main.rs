use std::process::ExitCode;

fn main() -> ExitCode {
    pillsprint_cli::run()
}

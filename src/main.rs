//! CLI entry point for the SOL25 analyzer. All logic lives in
//! [`sol25::driver`]; this binary only forwards the process exit code.

fn main() {
    std::process::exit(sol25::driver::run());
}

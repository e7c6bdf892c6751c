fn main() -> std::process::ExitCode {
    mcinstall_lib::run()
}

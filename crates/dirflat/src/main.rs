fn main() -> std::process::ExitCode {
    dirflat::cli::run()
}

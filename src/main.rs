fn main() -> std::process::ExitCode {
    ddns_agent_lib::run()
}

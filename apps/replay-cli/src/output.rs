pub fn print_banner() {
    println!(
        "{} v{}",
        replay_application::meta::engine_name(),
        env!("CARGO_PKG_VERSION")
    );
}

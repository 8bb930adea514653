pub fn engine_name() -> &'static str {
    "balance-replay"
}

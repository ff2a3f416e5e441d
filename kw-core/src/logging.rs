use tracing_subscriber::fmt::format::FmtSpan;

// Scenario runs are read after the fact from CI logs, so we want file/line information and span
// open events (each wait gets its own span) in the output.
pub fn setup(env_filter: &str) {
    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(env_filter)
        .compact()
        .init();
}

use continuum::{run, telemetry};

fn main() {
    telemetry::init();

    if let Err(e) = run::run() {
        tracing::error!("error: {e}");
        std::process::exit(1);
    }
}

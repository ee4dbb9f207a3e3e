use std::process::ExitCode;

use optiflow::app;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    app::finish("optiflow-generate-training-data", app::training::run().await)
}

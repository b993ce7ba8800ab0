use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match medassist_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("medassist: {e}");
            ExitCode::FAILURE
        }
    }
}

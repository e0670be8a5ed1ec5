#[tokio::main]
async fn main() {
    if let Err(e) = clinic_scheduler::run().await {
        tracing::error!("{e}");
        eprintln!("clinic-scheduler: {e}");
        std::process::exit(1);
    }
}

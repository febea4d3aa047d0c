#[tokio::main]
async fn main() {
    logpump::app::startup::startup().await;
}

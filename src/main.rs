#[tokio::main]
async fn main() {
    homestay_backend::run().await;
}

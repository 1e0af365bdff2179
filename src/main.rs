#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    scoop_station_lib::run().await
}

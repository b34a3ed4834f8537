#[actix_web::main]
async fn main() {
    if let Err(err) = fleetscan_lib::run().await {
        eprintln!("fleetscan: {}", err);
        std::process::exit(1);
    }
}

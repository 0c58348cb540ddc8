#[actix_web::main]
async fn main() -> std::io::Result<()> {
    agreement_server::run().await
}

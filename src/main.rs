#[actix_web::main]
async fn main() -> std::io::Result<()> {
    printer_service_server::run().await
}

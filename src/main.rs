//! Poetry Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() -> Result<(), poetry_backend::error::StartupError> {
    poetry_backend::run().await
}

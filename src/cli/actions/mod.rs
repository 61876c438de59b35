pub mod server;

/// Actions
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        redis_url: String,
        cors_origin: String,
    },
}

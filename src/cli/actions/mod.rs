pub mod server;

use std::path::PathBuf;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        accounts: PathBuf,
        frontend_url: String,
        session_ttl: u64,
    },
}

//! Taskyard server binary: env-configured scheduler listening for batch
//! submissions over TCP.

use std::thread;

use tracing::info;

use taskyard::config::ServerConfig;
use taskyard::core::AppResult;
use taskyard::net::Server;
use taskyard::util::telemetry;

fn main() -> AppResult<()> {
    telemetry::init_tracing();

    let config = ServerConfig::from_env();
    let server = Server::start(&config)?;
    info!(addr = %server.local_addr(), "taskyard accepting batch submissions");

    // All work happens on the acceptor, dispatcher, and worker threads.
    loop {
        thread::park();
    }
}

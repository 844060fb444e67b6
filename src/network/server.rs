//! TCP Server
//!
//! Accepts connections and dispatches them to handler threads.

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::config::Config;
use crate::database::Database;
use crate::error::Result;

use super::Connection;

/// TCP server for LatticeKV
pub struct Server {
    config: Config,
    database: Arc<Mutex<Database>>,
}

impl Server {
    /// Create a new server with the given config and database
    pub fn new(config: Config, database: Arc<Mutex<Database>>) -> Self {
        Self { config, database }
    }

    /// Start the server (blocking)
    ///
    /// Accepts connections until the listener fails; each connection gets
    /// its own handler thread.
    pub fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)?;

        tracing::info!("Listening on {}", self.config.listen_addr);

        let active = Arc::new(AtomicUsize::new(0));

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            if active.load(Ordering::Relaxed) >= self.config.max_connections {
                tracing::warn!(
                    "Connection limit ({}) reached, dropping new connection",
                    self.config.max_connections
                );
                continue;
            }

            let database = Arc::clone(&self.database);
            let active = Arc::clone(&active);
            let read_timeout = self.config.read_timeout_ms;
            let write_timeout = self.config.write_timeout_ms;

            active.fetch_add(1, Ordering::Relaxed);

            thread::spawn(move || {
                let result = Connection::new(stream, database).and_then(|mut conn| {
                    conn.set_timeouts(read_timeout, write_timeout)?;
                    conn.handle()
                });

                if let Err(e) = result {
                    tracing::warn!("Connection handler failed: {}", e);
                }

                active.fetch_sub(1, Ordering::Relaxed);
            });
        }

        Ok(())
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use taki_core::errors::Error;
use taki_core::types;
use taki_rpc::proto::scheduler::scheduler_client::SchedulerClient;
use tonic::transport::{Channel, Endpoint};

use crate::constant;

struct CachedClient {
    client: SchedulerClient<Channel>,
    last_access: Instant,
}

/// Pooled RPC clients for sibling scheduler instances, keyed by URI. Dials
/// lazily on first use; a background sweeper drops clients that sit unused.
#[derive(Clone)]
pub struct SchedulerClientCache {
    clients: Arc<Mutex<HashMap<String, CachedClient>>>,
}

impl SchedulerClientCache {
    pub fn new() -> Self {
        let cache = Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
        };
        cache.start_expirer();
        cache
    }

    fn start_expirer(&self) {
        let clients: Weak<Mutex<HashMap<String, CachedClient>>> = Arc::downgrade(&self.clients);

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(constant::UNUSED_SCHEDULER_CLIENT_CHECK_INTERVAL).await;
                let Some(clients) = clients.upgrade() else {
                    break;
                };
                clients.lock().unwrap().retain(|addr, cached| {
                    let keep = cached.last_access.elapsed()
                        <= constant::UNUSED_SCHEDULER_CLIENT_EXPIRATION;
                    if !keep {
                        tracing::info!("expiring idle scheduler client for '{}'", addr);
                    }
                    keep
                });
            }
        });
    }

    /// The dial is non-blocking, so holding the lock through it is fine. A
    /// duplicate dial across a brief race would only cost one extra
    /// connection.
    pub fn get(&self, scheduler_addr: &str) -> types::Result<SchedulerClient<Channel>> {
        let mut clients = self.clients.lock().unwrap();

        if let Some(cached) = clients.get_mut(scheduler_addr) {
            cached.last_access = Instant::now();
            return Ok(cached.client.clone());
        }

        tracing::info!("creating new scheduler client for '{}'", scheduler_addr);
        let endpoint = Endpoint::from_shared(scheduler_addr.to_string())
            .map_err(|e| Error::unavailable(format!("could not dial scheduler: {}", e)))?;
        let client = SchedulerClient::new(endpoint.connect_lazy());
        clients.insert(
            scheduler_addr.to_string(),
            CachedClient {
                client: client.clone(),
                last_access: Instant::now(),
            },
        );

        Ok(client)
    }
}

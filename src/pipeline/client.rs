// Shared HTTP client - built on first use, released once at shutdown

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::errors::{ClientError, ProviderError};
use super::http::ReqwestClient;
use super::models::NetworkConfig;
use super::traits::HttpClient;

/// Builds a component's HTTP client on first use
pub type ClientFactory =
    Box<dyn Fn() -> Result<Arc<dyn HttpClient>, ProviderError> + Send + Sync>;

enum ClientSlot {
    Uninit,
    Ready(Arc<dyn HttpClient>),
    Closed,
}

/// One long-lived client per component
pub struct SharedClient {
    owner: &'static str,
    factory: ClientFactory,
    slot: Mutex<ClientSlot>,
}

impl SharedClient {
    pub fn new(owner: &'static str, factory: ClientFactory) -> Self {
        Self {
            owner,
            factory,
            slot: Mutex::new(ClientSlot::Uninit),
        }
    }

    /// Reqwest client built from `network` on first use
    pub fn from_network(owner: &'static str, network: NetworkConfig) -> Self {
        let factory: ClientFactory = Box::new(move || {
            let client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&network)?);
            Ok(client)
        });
        Self::new(owner, factory)
    }

    /// Wrap an existing client
    pub fn fixed(owner: &'static str, client: Arc<dyn HttpClient>) -> Self {
        Self::new(owner, Box::new(move || Ok(client.clone())))
    }

    pub async fn get(&self) -> Result<Arc<dyn HttpClient>, ClientError> {
        let mut slot = self.slot.lock().await;
        match &*slot {
            ClientSlot::Ready(client) => return Ok(client.clone()),
            ClientSlot::Closed => return Err(ClientError::Closed),
            ClientSlot::Uninit => {}
        }

        let client = (self.factory)().map_err(|e| ClientError::Init(e.to_string()))?;
        debug!(owner = self.owner, "HTTP client initialised");
        *slot = ClientSlot::Ready(client.clone());
        Ok(client)
    }

    /// Release the client. Returns true only for the call that released it.
    pub async fn close(&self) -> bool {
        let mut slot = self.slot.lock().await;
        match std::mem::replace(&mut *slot, ClientSlot::Closed) {
            ClientSlot::Ready(_) => {
                info!(owner = self.owner, "HTTP client closed");
                true
            }
            ClientSlot::Uninit => true,
            ClientSlot::Closed => false,
        }
    }

    pub async fn is_closed(&self) -> bool {
        matches!(*self.slot.lock().await, ClientSlot::Closed)
    }
}

//! The fixed set of built-in tracker clients

use crate::goodreads::GoodreadsClient;
use crate::render::WebDriverRenderer;
use crate::storygraph::StoryGraphClient;
use crate::traits::PlatformClient;
use shelfsync_core::Platform;
use shelfsync_network::Client;
use std::collections::HashMap;
use std::sync::Arc;

/// Clients keyed by the platform they serve
#[derive(Clone, Default)]
pub struct PlatformClients {
    clients: HashMap<Platform, Arc<dyn PlatformClient>>,
}

impl PlatformClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Goodreads plus The StoryGraph with the WebDriver fallback
    pub fn builtin(http: Client) -> Self {
        let renderer = Arc::new(WebDriverRenderer::new(http.clone()));
        Self::new()
            .with_client(Arc::new(GoodreadsClient::new(http.clone())))
            .with_client(Arc::new(StoryGraphClient::new(http).with_renderer(renderer)))
    }

    /// Registers a client, replacing any previous one for its platform
    pub fn with_client(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.clients.insert(client.platform(), client);
        self
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformClient>> {
        self.clients.get(&platform).cloned()
    }
}

impl std::fmt::Debug for PlatformClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClients")
            .field("platforms", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

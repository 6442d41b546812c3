//! Bespoke per-entity sources
//!
//! Entities whose versions are not published through a package registry or
//! a source host get a hand-written source registered here under a name.
//! A custom entry is resolved by its lower-cased entity key first, then by
//! its full locator, then by the locator's scheme (`endoflife:python` ->
//! `endoflife`).

mod adoptium;
mod c_standard;
mod dotnet;
mod endoflife;
mod whatwg;

pub use adoptium::AdoptiumSource;
pub use c_standard::CStandardSource;
pub use dotnet::DotnetSource;
pub use endoflife::EndOfLifeSource;
pub use whatwg::WhatwgSource;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::Endpoints;
use crate::source::adapter::SourceAdapter;
use crate::sync::entry::SyncConfig;

#[derive(Default, Clone)]
pub struct CustomRegistry {
    sources: IndexMap<String, Arc<dyn SourceAdapter>>,
}

impl CustomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in source, each also reachable by its
    /// upstream's name so locators like `adoptium` resolve
    pub fn builtin(endpoints: &Endpoints) -> Self {
        let java: Arc<dyn SourceAdapter> = Arc::new(AdoptiumSource::new(&endpoints.adoptium));
        let dotnet: Arc<dyn SourceAdapter> = Arc::new(DotnetSource::new(&endpoints.dotnet));
        let c: Arc<dyn SourceAdapter> = Arc::new(CStandardSource::new(&endpoints.cppreference));
        let html: Arc<dyn SourceAdapter> = Arc::new(WhatwgSource::new(&endpoints.whatwg));

        Self::new()
            .register("java", java.clone())
            .register("adoptium", java)
            .register(".net", dotnet.clone())
            .register("dotnet", dotnet)
            .register("c", c.clone())
            .register("cppreference", c)
            .register("html", html.clone())
            .register("whatwg", html)
            .register(
                "endoflife",
                Arc::new(EndOfLifeSource::new(&endpoints.endoflife)),
            )
    }

    /// Adds or replaces the source registered under `key` (case-insensitive)
    pub fn register(mut self, key: &str, source: Arc<dyn SourceAdapter>) -> Self {
        self.sources.insert(key.to_lowercase(), source);
        self
    }

    pub fn resolve(&self, entry: &SyncConfig) -> Option<Arc<dyn SourceAdapter>> {
        let key = entry.entity_key.to_lowercase();
        let locator = entry.source_locator.to_lowercase();
        let scheme = locator.split_once(':').map(|(scheme, _)| scheme);

        [Some(key.as_str()), Some(locator.as_str()), scheme]
            .into_iter()
            .flatten()
            .find_map(|key| self.sources.get(key).cloned())
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}

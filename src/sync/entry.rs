//! Sync entries: which upstream source feeds each catalog entity

use serde::{Deserialize, Serialize};

/// Strategy used to fetch an entity's versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Package registry metadata (npm, PyPI, crates.io)
    RegistryApi,
    /// Source host "latest release" endpoint
    ReleaseApi,
    /// Source host tag listing
    TagApi,
    /// Bespoke fetch-and-parse routine
    Custom,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::RegistryApi => "registry_api",
            SourceKind::ReleaseApi => "release_api",
            SourceKind::TagApi => "tag_api",
            SourceKind::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    pub entity_key: String,
    pub source_kind: SourceKind,
    pub source_locator: String,
    #[serde(default)]
    pub wants_lts: bool,
    #[serde(default)]
    pub wants_edition: bool,
    #[serde(default)]
    pub wants_living_standard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lts_tag_prefix: Option<String>,
}

impl SyncConfig {
    pub fn new(entity_key: &str, source_kind: SourceKind, source_locator: &str) -> Self {
        Self {
            entity_key: entity_key.to_string(),
            source_kind,
            source_locator: source_locator.to_string(),
            wants_lts: false,
            wants_edition: false,
            wants_living_standard: false,
            lts_tag_prefix: None,
        }
    }

    pub fn with_lts(mut self) -> Self {
        self.wants_lts = true;
        self
    }

    pub fn with_lts_prefix(mut self, prefix: &str) -> Self {
        self.wants_lts = true;
        self.lts_tag_prefix = Some(prefix.to_string());
        self
    }

    pub fn with_edition(mut self) -> Self {
        self.wants_edition = true;
        self
    }

    pub fn with_living_standard(mut self) -> Self {
        self.wants_living_standard = true;
        self
    }
}

/// The entity list shipped with the binary
pub fn builtin_configs() -> Vec<SyncConfig> {
    use SourceKind::*;

    vec![
        // Package registries
        SyncConfig::new("TypeScript", RegistryApi, "npm:typescript"),
        SyncConfig::new("Angular", RegistryApi, "npm:@angular/core").with_lts(),
        SyncConfig::new("React", RegistryApi, "npm:react"),
        SyncConfig::new("Vue.js", RegistryApi, "npm:vue"),
        SyncConfig::new("Express", RegistryApi, "npm:express"),
        SyncConfig::new("Next.js", RegistryApi, "npm:next"),
        SyncConfig::new("Django", RegistryApi, "pypi:django"),
        SyncConfig::new("Flask", RegistryApi, "pypi:flask"),
        SyncConfig::new("Tokio", RegistryApi, "crates:tokio"),
        // Source host releases
        SyncConfig::new("Rust", ReleaseApi, "rust-lang/rust"),
        SyncConfig::new("Kotlin", ReleaseApi, "JetBrains/kotlin"),
        SyncConfig::new("Deno", ReleaseApi, "denoland/deno"),
        SyncConfig::new("Bun", ReleaseApi, "oven-sh/bun"),
        SyncConfig::new("Elixir", ReleaseApi, "elixir-lang/elixir"),
        SyncConfig::new("Gradle", ReleaseApi, "gradle/gradle"),
        SyncConfig::new("Julia", ReleaseApi, "JuliaLang/julia"),
        SyncConfig::new("Zig", ReleaseApi, "ziglang/zig"),
        // Source host tags
        SyncConfig::new("Node.js", TagApi, "nodejs/node").with_lts_prefix("22"),
        SyncConfig::new("PHP", TagApi, "php/php-src"),
        SyncConfig::new("Ruby", TagApi, "ruby/ruby"),
        SyncConfig::new("Go", TagApi, "golang/go"),
        SyncConfig::new("Erlang", TagApi, "erlang/otp"),
        SyncConfig::new("Swift", TagApi, "swiftlang/swift"),
        SyncConfig::new("Perl", TagApi, "Perl/perl5"),
        SyncConfig::new("Scala", TagApi, "scala/scala3"),
        SyncConfig::new("Lua", TagApi, "lua/lua"),
        SyncConfig::new("Maven", TagApi, "apache/maven"),
        SyncConfig::new("Haskell", TagApi, "ghc/ghc"),
        SyncConfig::new("Spring Boot", TagApi, "spring-projects/spring-boot")
            .with_lts_prefix("3.3"),
        SyncConfig::new("C++", TagApi, "cplusplus/draft"),
        SyncConfig::new("ECMAScript", TagApi, "tc39/ecma262").with_edition(),
        // Bespoke sources
        SyncConfig::new("Java", Custom, "adoptium").with_lts(),
        SyncConfig::new(".NET", Custom, "dotnet").with_lts(),
        SyncConfig::new("Python", Custom, "endoflife:python"),
        SyncConfig::new("Ubuntu", Custom, "endoflife:ubuntu").with_lts(),
        SyncConfig::new("PostgreSQL", Custom, "endoflife:postgresql"),
        SyncConfig::new("C", Custom, "cppreference:c"),
        SyncConfig::new("HTML", Custom, "whatwg:html").with_living_standard(),
    ]
}

use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_catalog::{AzureBlobConfig, CatalogConfig, MongoCatalogOptions, OpenAiConfig};
use strum::{Display, EnumString};

// Re-export Environment for use in other modules
pub use core_config::Environment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum CatalogBackendKind {
    MongoDb,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum BlobBackendKind {
    Azure,
    Memory,
}

/// Where catalog records live, selected by `CATALOG_BACKEND`.
#[derive(Clone, Debug)]
pub enum CatalogBackend {
    MongoDb {
        mongodb: MongoConfig,
        options: MongoCatalogOptions,
    },
    /// Process-local; contents are lost on restart
    Memory,
}

/// Where images live, selected by `BLOB_BACKEND`.
#[derive(Clone, Debug)]
pub enum BlobBackend {
    Azure(AzureBlobConfig),
    Memory,
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub catalog: CatalogConfig,
    pub catalog_backend: CatalogBackend,
    pub blob_backend: BlobBackend,
    pub openai: OpenAiConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let catalog = CatalogConfig::from_env()?;
        let openai = OpenAiConfig::from_env()?;

        let catalog_kind = parse_kind::<CatalogBackendKind>("CATALOG_BACKEND", "mongodb")?;
        let catalog_backend = match catalog_kind {
            CatalogBackendKind::MongoDb => CatalogBackend::MongoDb {
                mongodb: MongoConfig::from_env()?,
                options: MongoCatalogOptions::from_env()?,
            },
            CatalogBackendKind::Memory => CatalogBackend::Memory,
        };

        let blob_backend = match parse_kind::<BlobBackendKind>("BLOB_BACKEND", "azure")? {
            BlobBackendKind::Azure => BlobBackend::Azure(AzureBlobConfig::from_env()?),
            BlobBackendKind::Memory => BlobBackend::Memory,
        };

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            catalog,
            catalog_backend,
            blob_backend,
            openai,
        })
    }
}

fn parse_kind<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
    let raw = env_or_default(key, default);
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        details: format!("unknown backend '{}'", raw),
    })
}

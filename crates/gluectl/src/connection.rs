//! Connection management: profile, environment and flags resolved into a transport

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use gluectl_core::config::endpoint_for_region;
use gluectl_core::{Config, HttpTransport, Invoker, Profile, TransportConfig};
use tracing::{debug, info, trace};

use crate::error::{GlueCtlError, Result as CliResult};

/// Environment variables naming an explicit endpoint, in priority order
const ENDPOINT_ENV_VARS: &[&str] = &["GLUECTL_ENDPOINT_URL", "AWS_ENDPOINT_URL_GLUE"];

/// Environment variables naming a region, in priority order
const REGION_ENV_VARS: &[&str] = &["AWS_REGION", "AWS_DEFAULT_REGION"];

/// Connection-related global flags
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionOverrides<'a> {
    pub profile: Option<&'a str>,
    pub region: Option<&'a str>,
    pub endpoint_url: Option<&'a str>,
}

/// Where the endpoint came from, for logging and `profile show`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSource {
    Flag,
    Environment(&'static str),
    ProfileEndpoint(String),
    Region(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub url: String,
    pub source: EndpointSource,
    pub profile: Option<String>,
}

/// Connection manager for creating invokers
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with the given configuration
    #[allow(dead_code)] // Used by tests
    pub fn new(config: Config) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Resolve the profile named on the command line, or the configured default
    ///
    /// An explicitly named profile must exist; with no name and no profiles
    /// configured the result is `None`.
    pub fn resolve_profile(
        &self,
        explicit: Option<&str>,
    ) -> CliResult<Option<(String, &Profile)>> {
        let Some(name) = self.config.resolve_profile_name(explicit) else {
            return Ok(None);
        };
        let profile = self.config.profile(&name)?;
        Ok(Some((name, profile)))
    }

    /// Resolve the service endpoint
    ///
    /// `--endpoint-url` > endpoint environment variables > profile
    /// `endpoint_url` > region (`--region` > region environment variables >
    /// profile `region`). When --config-file is given explicitly,
    /// environment variables are ignored.
    pub fn resolve_endpoint(&self, overrides: ConnectionOverrides<'_>) -> CliResult<ResolvedEndpoint> {
        self.resolve_endpoint_with(overrides, |key| std::env::var(key).ok())
    }

    fn resolve_endpoint_with(
        &self,
        overrides: ConnectionOverrides<'_>,
        env: impl Fn(&str) -> Option<String>,
    ) -> CliResult<ResolvedEndpoint> {
        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env_lookup = |keys: &[&'static str]| -> Option<(&'static str, String)> {
            if !use_env_vars {
                return None;
            }
            keys.iter().find_map(|key| {
                env(*key)
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| (*key, value))
            })
        };

        let profile = self.resolve_profile(overrides.profile)?;
        let profile_name = profile.as_ref().map(|(name, _)| name.clone());
        if let Some(name) = &profile_name {
            info!("Using profile: {}", name);
        }

        if let Some(url) = overrides.endpoint_url {
            trace!("Endpoint from --endpoint-url");
            return Ok(ResolvedEndpoint {
                url: url.to_string(),
                source: EndpointSource::Flag,
                profile: profile_name,
            });
        }

        if let Some((key, url)) = env_lookup(ENDPOINT_ENV_VARS) {
            debug!("Found {} environment variable", key);
            return Ok(ResolvedEndpoint {
                url,
                source: EndpointSource::Environment(key),
                profile: profile_name,
            });
        }

        if let Some((name, p)) = &profile
            && let Some(url) = &p.endpoint_url
        {
            return Ok(ResolvedEndpoint {
                url: url.clone(),
                source: EndpointSource::ProfileEndpoint(name.clone()),
                profile: profile_name,
            });
        }

        let region = overrides
            .region
            .map(str::to_string)
            .or_else(|| env_lookup(REGION_ENV_VARS).map(|(_, region)| region))
            .or_else(|| profile.as_ref().and_then(|(_, p)| p.region.clone()))
            .ok_or(GlueCtlError::NoEndpoint)?;

        let url = endpoint_for_region(&region)?;
        Ok(ResolvedEndpoint {
            url,
            source: EndpointSource::Region(region),
            profile: profile_name,
        })
    }

    /// Build an invoker over HTTP for the resolved endpoint and profile settings
    pub fn create_invoker(
        &self,
        overrides: ConnectionOverrides<'_>,
    ) -> CliResult<Invoker<HttpTransport>> {
        let endpoint = self.resolve_endpoint(overrides)?;
        info!("Using endpoint {} ({:?})", endpoint.url, endpoint.source);

        let mut transport_config = TransportConfig::new(endpoint.url);
        if let Some(name) = &endpoint.profile {
            let profile = self.config.profile(name)?;
            if let Some(timeout) = profile.timeout() {
                transport_config = transport_config.with_timeout(timeout);
            }
            for (header, value) in &profile.headers {
                transport_config = transport_config.with_header(header, value);
            }
        }
        trace!(
            "Transport timeout: {:?}, {} extra headers",
            transport_config.timeout,
            transport_config.headers.len()
        );

        let transport = HttpTransport::new(transport_config)?;
        Ok(Invoker::new(transport))
    }
}

/// Request timeout in effect for a profile
pub fn effective_timeout(profile: &Profile) -> Duration {
    profile
        .timeout()
        .unwrap_or(gluectl_core::transport::DEFAULT_TIMEOUT)
}

//! Profile management command implementations

use gluectl_core::config::endpoint_for_region;
use gluectl_core::{Config, Profile};
use serde_json::{Value, json};
use tracing::{debug, info, trace};

use crate::cli::{GlobalArgs, OutputFormat, ProfileCommands};
use crate::connection::{ConnectionManager, effective_timeout};
use crate::error::{GlueCtlError, Result as CliResult};
use crate::output;

/// Handle profile management commands
pub fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &mut ConnectionManager,
    global: &GlobalArgs,
) -> CliResult<()> {
    use ProfileCommands::*;

    let output_format = global.output;
    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            timeout_secs,
            headers,
            default,
        } => handle_set(
            conn_mgr,
            name,
            ProfileSettings {
                region: global.region.clone(),
                endpoint_url: global.endpoint_url.clone(),
                timeout_secs: *timeout_secs,
                headers,
            },
            *default,
        ),
        Remove { name } => handle_remove(conn_mgr, name),
        Default { name } => handle_default(conn_mgr, name),
    }
}

fn config_path_display(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .or_else(|| Config::config_path().ok().map(|p| p.display().to_string()))
}

fn profile_json(name: &str, profile: &Profile, is_default: bool) -> Value {
    let mut obj = json!({
        "name": name,
        "is_default": is_default,
        "timeout_secs": effective_timeout(profile).as_secs(),
    });
    if let Some(region) = &profile.region {
        obj["region"] = json!(region);
    }
    if let Some(endpoint) = &profile.endpoint_url {
        obj["endpoint_url"] = json!(endpoint);
    }
    if !profile.headers.is_empty() {
        obj["headers"] = json!(profile.headers);
    }
    obj
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default = conn_mgr.config.default_profile.as_deref();

    match output_format {
        OutputFormat::Auto => {
            if let Some(path) = config_path_display(conn_mgr) {
                println!("Configuration file: {}", path);
                println!();
            }

            if profiles.is_empty() {
                info!("No profiles configured");
                println!("No profiles configured.");
                println!("Use 'gluectl profile set' to create a profile.");
                return Ok(());
            }

            for (name, profile) in &profiles {
                let marker = if default == Some(name.as_str()) {
                    "*"
                } else {
                    " "
                };
                let target = profile
                    .endpoint_url
                    .clone()
                    .or_else(|| profile.region.clone())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} {:<20} {}", marker, name, target);
            }
        }
        _ => {
            let list: Vec<Value> = profiles
                .iter()
                .map(|(name, profile)| profile_json(name, profile, default == Some(name.as_str())))
                .collect();
            let doc = json!({
                "config_path": config_path_display(conn_mgr),
                "profiles": list,
                "count": profiles.len(),
            });
            output::print_output(&doc, output_format.into(), None)?;
        }
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let path = config_path_display(conn_mgr).ok_or_else(|| {
        GlueCtlError::Configuration("could not determine the configuration directory".to_string())
    })?;
    match output_format {
        OutputFormat::Auto => println!("{}", path),
        _ => output::print_output(json!({"config_path": path}), output_format.into(), None)?,
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);

    // A profile with an unusable region is still shown, with the problem
    let endpoint = match profile.endpoint() {
        Ok(endpoint) => endpoint,
        Err(e) => Some(format!("<{}>", e)),
    };

    match output_format {
        OutputFormat::Auto => {
            println!("Profile: {}{}", name, if is_default { " (default)" } else { "" });
            if let Some(region) = &profile.region {
                println!("Region: {}", region);
            }
            println!(
                "Endpoint: {}",
                endpoint.as_deref().unwrap_or("<none: pass --region or --endpoint-url>")
            );
            println!("Timeout: {}s", effective_timeout(profile).as_secs());
            for (header, value) in &profile.headers {
                println!("Header: {}: {}", header, value);
            }
        }
        _ => {
            let mut doc = profile_json(name, profile, is_default);
            doc["endpoint"] = json!(endpoint);
            output::print_output(&doc, output_format.into(), None)?;
        }
    }
    Ok(())
}

/// Values for `profile set`; unset fields keep their current value
struct ProfileSettings<'a> {
    region: Option<String>,
    endpoint_url: Option<String>,
    timeout_secs: Option<u64>,
    headers: &'a [String],
}

fn apply_settings(profile: &mut Profile, settings: ProfileSettings<'_>) -> CliResult<()> {
    if let Some(region) = settings.region {
        endpoint_for_region(&region)?;
        profile.region = Some(region);
    }
    if let Some(endpoint) = settings.endpoint_url {
        url_check(&endpoint)?;
        profile.endpoint_url = Some(endpoint);
    }
    if let Some(timeout) = settings.timeout_secs {
        if timeout == 0 {
            return Err(GlueCtlError::InvalidInput {
                message: "--timeout-secs must be greater than zero".to_string(),
            });
        }
        profile.timeout_secs = Some(timeout);
    }
    for header in settings.headers {
        let (key, value) = header
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| GlueCtlError::InvalidInput {
                message: format!("header '{}' must look like NAME=VALUE", header),
            })?;
        profile
            .headers
            .insert(key.trim().to_string(), value.to_string());
    }
    Ok(())
}

fn url_check(endpoint: &str) -> CliResult<()> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(())
    } else {
        Err(GlueCtlError::InvalidInput {
            message: format!(
                "endpoint '{}' must start with http:// or https://",
                endpoint
            ),
        })
    }
}

fn handle_set(
    conn_mgr: &mut ConnectionManager,
    name: &str,
    settings: ProfileSettings<'_>,
    make_default: bool,
) -> CliResult<()> {
    debug!("Setting profile '{}'", name);
    let existed = conn_mgr.config.profiles.contains_key(name);
    let mut profile = conn_mgr
        .config
        .profiles
        .get(name)
        .cloned()
        .unwrap_or_default();
    apply_settings(&mut profile, settings)?;

    if profile.region.is_none() && profile.endpoint_url.is_none() {
        return Err(GlueCtlError::InvalidInput {
            message: format!(
                "profile '{}' needs --region or --endpoint-url",
                name
            ),
        });
    }

    conn_mgr.config.set_profile(name.to_string(), profile);
    if make_default || conn_mgr.config.default_profile.is_none() {
        conn_mgr.config.default_profile = Some(name.to_string());
    }
    conn_mgr.save_config()?;

    info!("Profile '{}' saved", name);
    println!(
        "Profile '{}' {}",
        name,
        if existed { "updated" } else { "created" }
    );
    Ok(())
}

fn handle_remove(conn_mgr: &mut ConnectionManager, name: &str) -> CliResult<()> {
    if conn_mgr.config.remove_profile(name).is_none() {
        return Err(GlueCtlError::ProfileNotFound {
            name: name.to_string(),
        });
    }
    conn_mgr.save_config()?;
    println!("Profile '{}' removed", name);
    Ok(())
}

fn handle_default(conn_mgr: &mut ConnectionManager, name: &str) -> CliResult<()> {
    conn_mgr.config.profile(name)?;
    conn_mgr.config.default_profile = Some(name.to_string());
    conn_mgr.save_config()?;
    println!("Default profile set to '{}'", name);
    Ok(())
}

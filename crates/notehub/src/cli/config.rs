//! Config command handlers

use notehub_core::Config;

use crate::cli::args::ConfigCommands;
use crate::cli::report;

/// Write a fresh config file for `owner/repo`.
pub fn handle_init(
    owner: String,
    repo: String,
    token: Option<String>,
    branch: Option<String>,
    daily_folder: Option<String>,
) -> bool {
    let mut config = Config::load().unwrap_or_default();
    config.owner = Some(owner);
    config.repo = Some(repo);
    if token.is_some() {
        config.token = token;
    }
    if let Some(branch) = branch {
        config.branch = branch;
    }
    if let Some(folder) = daily_folder {
        config.daily_folder = folder;
    }

    if let Err(e) = config.save() {
        report(&e);
        return false;
    }

    println!(
        "✓ Configured {}/{}",
        display(&config.owner),
        display(&config.repo)
    );
    if let Some(path) = Config::config_path() {
        println!("  Config file: {}", path.display());
    }
    if config.clone().with_env_overrides().token.is_none() {
        println!("  No token yet: set NOTEHUB_GITHUB_TOKEN or run 'notehub config set token <token>'");
    }
    true
}

pub fn handle_config_command(command: Option<ConfigCommands>) -> bool {
    match command {
        None | Some(ConfigCommands::Show) => show_config(),
        Some(ConfigCommands::Set { key, value }) => set_config(&key, &value),
        Some(ConfigCommands::Path) => match Config::config_path() {
            Some(path) => {
                println!("{}", path.display());
                true
            }
            None => {
                eprintln!("✗ Could not determine config directory");
                false
            }
        },
    }
}

/// Show the effective configuration (file plus environment)
fn show_config() -> bool {
    let config = match Config::load() {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            report(&e);
            return false;
        }
    };

    println!("Notehub Configuration");
    println!("=====================");
    println!("Repository: {}/{}", display(&config.owner), display(&config.repo));
    println!("Branch: {}", config.branch);
    println!("API: {}", config.api_base_url);
    println!("Token: {}", redact(&config.token));
    println!("Daily folder: {}", config.daily_folder);
    println!("Autosave debounce: {} ms", config.autosave_debounce().as_millis());
    println!("Recent days: {}", config.recent_days);
    println!("Request timeout: {} s", config.request_timeout().as_secs());
    if let Some(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
    true
}

fn set_config(key: &str, value: &str) -> bool {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            report(&e);
            return false;
        }
    };

    if let Err(message) = set_value(&mut config, key, value) {
        eprintln!("✗ {}", message);
        return false;
    }
    if let Err(e) = config.save() {
        report(&e);
        return false;
    }

    println!("✓ Set {}", key);
    true
}

/// Assign one config key from its string form.
fn set_value(config: &mut Config, key: &str, value: &str) -> Result<(), String> {
    let number = |value: &str| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("'{}' expects a whole number, got '{}'", key, value))
    };

    match key {
        "owner" => config.owner = Some(value.to_string()),
        "repo" => config.repo = Some(value.to_string()),
        "token" => config.token = Some(value.to_string()),
        "branch" => config.branch = value.to_string(),
        "api_base_url" => config.api_base_url = value.trim_end_matches('/').to_string(),
        "daily_folder" => config.daily_folder = value.to_string(),
        "autosave_debounce_ms" => config.autosave_debounce_ms = number(value)?,
        "recent_days" => {
            config.recent_days = usize::try_from(number(value)?).map_err(|e| e.to_string())?
        }
        "request_timeout_secs" => config.request_timeout_secs = number(value)?,
        _ => return Err(format!("Unknown config key '{}'", key)),
    }
    Ok(())
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not set)")
}

fn redact(token: &Option<String>) -> String {
    match token.as_deref() {
        None | Some("") => "(not set)".to_string(),
        Some(token) if token.len() <= 8 => "****".to_string(),
        Some(token) => format!("{}…", token.chars().take(4).collect::<String>()),
    }
}

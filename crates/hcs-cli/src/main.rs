//! Host Content Settings CLI
//!
//! CLI tool for checking match patterns and inspecting or editing preference
//! documents.

use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};

use hcs_core::{
    parse_extension_pattern, ContentSettingsType, HostContentSettingsMap, SettingRecord,
};
use hcs_prefs::{parse_extension_rules, parse_prefs, write_prefs};

#[derive(Parser)]
#[command(name = "hcs-cli")]
#[command(about = "Host content settings pattern and preference tools")]
struct Cli {
    /// Verbose logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse extension match patterns and print their canonical form
    Parse {
        /// Patterns to parse
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Show the effective settings for a host or URL
    Lookup {
        /// Preference document
        #[arg(short, long)]
        prefs: String,

        /// Host or URL to resolve
        #[arg(long)]
        host: String,

        /// Only show this content type
        #[arg(short = 't', long = "type")]
        content_type: Option<String>,
    },

    /// List all overrides of one content type
    List {
        /// Preference document
        #[arg(short, long)]
        prefs: String,

        /// Content type to list
        #[arg(short = 't', long = "type")]
        content_type: String,
    },

    /// Apply extension rules to a preference document
    Import {
        /// Preference document
        #[arg(short, long)]
        prefs: String,

        /// Extension rules file
        #[arg(short, long)]
        rules: String,

        /// Output document (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Reset a preference document to the built-in defaults
    Reset {
        /// Preference document
        #[arg(short, long)]
        prefs: String,

        /// Output document (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Parse { patterns } => cmd_parse(&patterns),
        Commands::Lookup {
            prefs,
            host,
            content_type,
        } => cmd_lookup(&prefs, &host, content_type.as_deref()),
        Commands::List {
            prefs,
            content_type,
        } => cmd_list(&prefs, &content_type),
        Commands::Import {
            prefs,
            rules,
            output,
        } => cmd_import(&prefs, &rules, output.as_deref()),
        Commands::Reset { prefs, output } => cmd_reset(&prefs, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn cmd_parse(patterns: &[String]) -> Result<(), String> {
    let mut failures = 0usize;
    for input in patterns {
        match parse_extension_pattern(input) {
            Ok(pattern) => println!("{input} -> {pattern}"),
            Err(e) => {
                println!("{input} -> invalid: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} patterns are invalid", failures, patterns.len()));
    }
    Ok(())
}

fn cmd_lookup(prefs_path: &str, host: &str, content_type: Option<&str>) -> Result<(), String> {
    let map = load_store(prefs_path)?;

    match content_type {
        Some(name) => {
            let content_type = parse_content_type(name)?;
            println!("{}", map.content_setting(host, content_type));
        }
        None => {
            let settings = map.content_settings(host);
            println!("Settings for {host}:");
            for (content_type, setting) in settings.iter() {
                println!("  {:<14} {}", content_type.name(), setting);
            }
            if map.block_third_party_cookies() {
                println!("  (third-party cookies blocked)");
            }
        }
    }

    Ok(())
}

fn cmd_list(prefs_path: &str, content_type: &str) -> Result<(), String> {
    let content_type = parse_content_type(content_type)?;
    let map = load_store(prefs_path)?;

    println!(
        "{} (default: {})",
        content_type.name(),
        map.default_content_setting(content_type)
    );
    for (pattern, setting) in map.settings_for_one_type(content_type) {
        println!("  {:<40} {}", pattern.to_string(), setting);
    }

    Ok(())
}

fn cmd_import(prefs_path: &str, rules_path: &str, output: Option<&str>) -> Result<(), String> {
    let map = load_store(prefs_path)?;

    let text = fs::read_to_string(rules_path)
        .map_err(|e| format!("Failed to read '{}': {}", rules_path, e))?;
    let rules = parse_extension_rules(&text)
        .map_err(|e| format!("Invalid rules in '{}': {}", rules_path, e))?;
    let rule_count = rules.len();

    let changed = map.apply(rules.into_iter().map(SettingRecord::from));

    let output = output.unwrap_or(prefs_path);
    save_store(&map, output)?;

    println!("Imported {} rules into '{}' ({} changed)", rule_count, output, changed);
    Ok(())
}

fn cmd_reset(prefs_path: &str, output: Option<&str>) -> Result<(), String> {
    let map = load_store(prefs_path)?;
    map.reset_to_defaults();

    let output = output.unwrap_or(prefs_path);
    save_store(&map, output)?;

    println!("Reset '{}' to defaults", output);
    Ok(())
}

fn parse_content_type(name: &str) -> Result<ContentSettingsType, String> {
    ContentSettingsType::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = ContentSettingsType::ALL.iter().map(|t| t.name()).collect();
        format!("Unknown content type '{}' (expected one of: {})", name, known.join(", "))
    })
}

/// Load a preference document. A missing file is an empty store.
fn load_store(path: &str) -> Result<HostContentSettingsMap, String> {
    if !Path::new(path).exists() {
        log::debug!("'{path}' does not exist, starting from defaults");
        return Ok(HostContentSettingsMap::new());
    }

    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    let prefs = parse_prefs(&text)
        .map_err(|e| format!("Invalid preferences in '{}': {}", path, e))?;

    if prefs.stats.skipped > 0 {
        log::warn!("'{}': skipped {} unusable entries", path, prefs.stats.skipped);
    }

    Ok(prefs.build_store())
}

fn save_store(map: &HostContentSettingsMap, path: &str) -> Result<(), String> {
    let json = write_prefs(map).map_err(|e| format!("Failed to serialize preferences: {}", e))?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
        }
    }
    fs::write(path, json).map_err(|e| format!("Failed to write '{}': {}", path, e))
}

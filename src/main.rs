//! pynew - create Python files from named templates
//!
//! Command-line front end over the template store, the TTL cache and the
//! settings registry.

mod cli;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{
    parse_json_or_string, CacheCommand, Cli, Command, ContentArgs, MetadataArgs, NewArgs,
    SettingsCommand, TemplateCommand,
};
use pynew::templates::{placeholders, random_name, TemplateMetadata};
use pynew::{App, Config};

/// Prefix of generated template names
const RANDOM_TEMPLATE_PREFIX: &str = "template";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose { "pynew=debug" } else { "pynew=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(dir) = cli.templates_dir {
        config.templates_dir = dir;
    }
    if let Some(path) = cli.cache_file {
        config.cache_path = path;
    }
    if let Some(path) = cli.settings_file {
        config.settings_path = path;
    }
    debug!(
        "Configuration loaded: templates_dir={}, cache={}, max_entries={}, settings={}",
        config.templates_dir.display(),
        config.cache_path.display(),
        config.max_entries,
        config.settings_path.display()
    );

    let app = App::from_config(config);
    match cli.command {
        Command::New(args) => run_new(&app, args),
        Command::Template { command } => run_template(&app, command),
        Command::Cache { command } => run_cache(&app, command),
        Command::Settings { command } => run_settings(&app, command),
    }
}

// == new ==
fn run_new(app: &App, args: NewArgs) -> Result<()> {
    let store = app.open_templates().context("Failed to open template directory")?;

    let template = match args.template.or_else(|| app.last_template()) {
        Some(template) => template,
        None => bail!("No template given and no template used before"),
    };

    let variables = app.variables_for(
        &store,
        &template,
        &args.vars.vars,
        args.vars.auto_fill,
        &args.dir,
    )?;
    let path = app
        .create_file(
            &store,
            &template,
            &args.dir,
            args.name.as_deref(),
            &variables,
            args.force,
        )
        .with_context(|| format!("Failed to create a file from {}", template))?;

    println!("{}", path.display());
    Ok(())
}

// == template ==
fn run_template(app: &App, command: TemplateCommand) -> Result<()> {
    let mut store = app.open_templates().context("Failed to open template directory")?;

    match command {
        TemplateCommand::List => {
            for name in store.list()? {
                println!("{}", name);
            }
        }
        TemplateCommand::Show { name, metadata } => {
            if !store.exists(&name)? {
                bail!("Template not found: {}", name);
            }
            if metadata {
                print_json(&store.metadata(&name)?)?;
            } else {
                print!("{}", store.load(&name)?);
            }
        }
        TemplateCommand::Render { name, vars } => {
            if !store.exists(&name)? {
                bail!("Template not found: {}", name);
            }
            let variables =
                app.variables_for(&store, &name, &vars.vars, vars.auto_fill, Path::new("."))?;
            print!("{}", store.render(&name, &variables)?);
        }
        TemplateCommand::Create {
            name,
            source,
            metadata,
        } => {
            let content = read_content(source)?;
            let metadata = build_metadata(metadata, &content);
            let name = name.unwrap_or_else(|| random_name(RANDOM_TEMPLATE_PREFIX));
            let name = store.create(&name, &content, Some(metadata))?;
            println!("{}", name);
        }
        TemplateCommand::Save {
            name,
            source,
            metadata,
            no_overwrite,
        } => {
            let content = read_content(source)?;
            let metadata = build_metadata(metadata, &content);
            let name = store.save(&name, &content, Some(metadata), !no_overwrite)?;
            println!("{}", name);
        }
        TemplateCommand::Delete { name } => {
            if !store.delete(&name)? {
                bail!("Template not found: {}", name);
            }
            info!("Deleted {}", name);
        }
        TemplateCommand::Rename { old, new } => {
            let name = store.rename(&old, &new)?;
            println!("{}", name);
        }
        TemplateCommand::Placeholders { name } => {
            for key in placeholders(&store.load(&name)?) {
                println!("{}", key);
            }
        }
    }
    Ok(())
}

/// Explicit variables win; otherwise they are inferred from the content.
fn build_metadata(args: MetadataArgs, content: &str) -> TemplateMetadata {
    let variables = if args.variables.is_empty() {
        placeholders(content)
    } else {
        args.variables
    };
    TemplateMetadata {
        description: args.description,
        variables,
    }
}

fn read_content(source: ContentArgs) -> Result<String> {
    if let Some(content) = source.content {
        return Ok(content);
    }
    if let Some(path) = source.file {
        return fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read template content from stdin")?;
    Ok(content)
}

// == cache ==
fn run_cache(app: &App, command: CacheCommand) -> Result<()> {
    let cache = &app.cache;

    match command {
        CacheCommand::Get { key } => match cache.get::<serde_json::Value>(&key)? {
            Some(value) => print_json(&value)?,
            None => bail!("Key not found: {}", key),
        },
        CacheCommand::Set { key, value, ttl } => {
            cache.set(&key, &parse_json_or_string(&value), ttl)?;
        }
        CacheCommand::Delete { key } => {
            if !cache.delete(&key)? {
                bail!("Key not found: {}", key);
            }
        }
        CacheCommand::Keys => {
            for key in cache.keys() {
                println!("{}", key);
            }
        }
        CacheCommand::Size => println!("{}", cache.size()),
        CacheCommand::Clear => cache.clear()?,
        CacheCommand::Prune => {
            let removed = cache.cleanup_expired()?;
            println!("{}", removed);
        }
        CacheCommand::Ttl { key } => match cache.ttl_remaining(&key) {
            Some(remaining) => println!("{:.3}", remaining.as_secs_f64()),
            None => bail!("Key not found or has no expiry: {}", key),
        },
        CacheCommand::Stats => print_json(&cache.load_report())?,
    }
    Ok(())
}

// == settings ==
fn run_settings(app: &App, command: SettingsCommand) -> Result<()> {
    let settings = &app.settings;

    match command {
        SettingsCommand::List => print_json(&settings.load())?,
        SettingsCommand::Get { key } => match settings.get::<serde_json::Value>(&key)? {
            Some(value) => print_json(&value)?,
            None => bail!("Setting not found: {}", key),
        },
        SettingsCommand::Set { key, value } => {
            settings.set(&key, &parse_json_or_string(&value))?;
        }
        SettingsCommand::Delete { key } => {
            if !settings.delete(&key)? {
                bail!("Setting not found: {}", key);
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

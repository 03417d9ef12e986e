mod config;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use shared::{
    domain::{FieldSpec, ResourceId, ResourceKind, SourceType, TemplateId},
    protocol::ResourcePatch,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wizard_core::{
    CommitCoordinator, DeleteOutcome, DraftWizard, HttpResourceApi, ResourceApi,
    ResourcePage, TemplateCache,
};

#[derive(Parser, Debug)]
#[command(about = "Create and manage datablocks, models and training jobs")]
struct Args {
    #[arg(long, global = true, default_value = "datablock", value_parser = parse_kind)]
    kind: ResourceKind,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the templates available for the kind.
    Templates,
    /// List existing resources.
    List,
    /// Run the creation wizard non-interactively.
    Create(CreateArgs),
    /// Edit an existing resource; live resources get a queued update.
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        fields: Option<PathBuf>,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a resource; live resources are only marked for deletion.
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(ClapArgs, Debug)]
struct CreateArgs {
    #[arg(long)]
    template: Option<i64>,
    #[arg(long)]
    display_name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_parser = parse_source_type)]
    source_type: Option<SourceType>,
    /// JSON array of field definitions. Replaces the template's default
    /// fields when combined with --template.
    #[arg(long)]
    fields: Option<PathBuf>,
}

fn parse_kind(raw: &str) -> std::result::Result<ResourceKind, String> {
    ResourceKind::parse(raw).ok_or_else(|| {
        format!("unknown kind '{raw}' (expected datablock, prediction_model or training_job)")
    })
}

fn parse_source_type(raw: &str) -> std::result::Result<SourceType, String> {
    SourceType::parse(raw)
        .ok_or_else(|| format!("unknown source type '{raw}' (expected database, file, api or stream)"))
}

fn read_fields(path: &Path) -> Result<Vec<FieldSpec>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read fields from '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON array of fields", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(&args.config)?;
    if let Some(api_url) = &args.api_url {
        settings.api_url = config::normalize_api_url(api_url)?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!(api_url = %settings.api_url, kind = %args.kind, "wizard_cli starting");

    let api: Arc<dyn ResourceApi> = Arc::new(
        HttpResourceApi::with_options(
            &settings.api_url,
            settings.api_token.clone(),
            settings.request_timeout(),
        )
        .context("failed to build api client")?,
    );
    let kind = args.kind;

    match args.command {
        Command::Templates => {
            let cache = TemplateCache::new(api);
            print_json(&cache.templates(kind).await?)?;
        }
        Command::List => {
            let mut page = ResourcePage::new(kind, api);
            page.refresh().await?;
            print_json(&page.resources().as_slice())?;
        }
        Command::Create(create) => run_create(kind, api, create).await?,
        Command::Edit {
            id,
            fields,
            display_name,
            description,
        } => {
            let patch = ResourcePatch {
                display_name,
                description,
                fields: fields.as_deref().map(read_fields).transpose()?,
            };
            if patch.is_empty() {
                bail!("nothing to edit: pass --fields, --display-name or --description");
            }
            let mut page = ResourcePage::new(kind, api);
            page.refresh().await?;
            let saved = page.save_edit(ResourceId(id), patch).await?;
            print_json(&saved)?;
        }
        Command::Delete { id } => {
            let mut page = ResourcePage::new(kind, api);
            page.refresh().await?;
            match page.delete(ResourceId(id)).await? {
                DeleteOutcome::SoftDeleted(marked) => {
                    println!("{} {} marked for deletion", kind.label(), marked.resource_id)
                }
                DeleteOutcome::Removed(removed) => println!("{} {removed} deleted", kind.label()),
            }
        }
    }

    Ok(())
}

async fn run_create(kind: ResourceKind, api: Arc<dyn ResourceApi>, create: CreateArgs) -> Result<()> {
    let coordinator = CommitCoordinator::new(api.clone());
    let mut page = ResourcePage::new(kind, api.clone());
    let mut wizard = DraftWizard::open(kind, coordinator)?;

    match create.template {
        Some(template_id) => {
            let cache = TemplateCache::new(api);
            let template = cache.find(kind, TemplateId(template_id)).await?;
            wizard.choose_template(&template)?;
        }
        None => wizard.choose_custom()?,
    }

    if let Some(source_type) = create.source_type {
        wizard.set_source_type(source_type)?;
    }
    if let Some(display_name) = create.display_name {
        wizard.set_display_name(display_name)?;
    }
    if let Some(description) = create.description {
        wizard.set_description(description)?;
    }
    if let Some(path) = &create.fields {
        wizard.replace_fields(&read_fields(path)?)?;
    }

    while !wizard.on_last_step() {
        if !wizard.advance()? {
            bail!(
                "cannot continue past the {} step; check the supplied options",
                wizard.current_step().label()
            );
        }
    }

    let resource = wizard.confirm(&mut page).await?;
    print_json(&resource)
}

//! mytardis: a command-line client for the MyTardis REST API.
//!
//! The library wraps the API's list/get/create/update operations for
//! experiments, datasets, datafiles, instruments, facilities and replicas.
//! List queries come back as a lazily paginated [`model::ResultSet`]; records
//! and result sets render as JSON or as ASCII tables.
//!
//! # Modules
//!
//! - [`config`]: Server URL, credentials and cache settings
//! - [`api`]: HTTP transport, response cache and the resource accessor
//! - [`model`]: Resource kinds, records and paginated result sets
//! - [`render`]: JSON and table output
//! - [`error`]: Error types for mytardis operations

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod render;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use api::{
    parse_filter, CachedTransport, Client, ListQuery, ResourceClient, ResponseCache, Transport,
    UreqTransport,
};
use config::Config;
use model::{fields, ResourceKind, ResourceRecord};
use render::{records_table, render_all, Render, RenderFormat};

pub use error::MytardisError;

/// The mytardis CLI application.
#[derive(Parser)]
#[command(name = "mytardis")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options accepted before or after any subcommand.
#[derive(clap::Args)]
struct GlobalArgs {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true, env = "MYTARDIS_CONFIG")]
    config: Option<PathBuf>,

    /// MyTardis URL, overriding the config file.
    #[arg(long, global = true, env = "MYTARDIS_URL")]
    url: Option<String>,

    /// MyTardis username, overriding the config file.
    #[arg(long, global = true, env = "MYTARDIS_USERNAME")]
    username: Option<String>,

    /// MyTardis API key, overriding the config file.
    #[arg(long, global = true, env = "MYTARDIS_APIKEY", hide_env_values = true)]
    apikey: Option<String>,

    /// Bypass the response cache.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Log requests and cache activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Query the API root.
    Api {
        #[command(subcommand)]
        command: ApiCommand,
    },
    /// Query facilities.
    Facility {
        #[command(subcommand)]
        command: FacilityCommand,
    },
    /// Query and manage instruments.
    Instrument {
        #[command(subcommand)]
        command: InstrumentCommand,
    },
    /// Query and manage experiments.
    Experiment {
        #[command(subcommand)]
        command: ExperimentCommand,
    },
    /// Query and manage datasets.
    Dataset {
        #[command(subcommand)]
        command: DatasetCommand,
    },
    /// Query and update datafiles.
    Datafile {
        #[command(subcommand)]
        command: DatafileCommand,
    },
    /// Show or save the client configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ApiCommand {
    /// List the API endpoints the server exposes.
    List {
        #[arg(long)]
        json: bool,
    },
}

/// Pagination, filtering and output options shared by every `list`.
#[derive(clap::Args)]
struct ListOptions {
    /// Maximum number of records per page.
    #[arg(long)]
    limit: Option<usize>,

    /// Number of records to skip.
    #[arg(long)]
    offset: Option<usize>,

    /// Field to sort by; prefix with '-' for descending order.
    #[arg(long)]
    order_by: Option<String>,

    /// Extra filter term (repeatable).
    #[arg(long = "filter", value_name = "FIELD=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Fetch every page instead of only the first.
    #[arg(long)]
    all: bool,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

impl ListOptions {
    /// Builds the query: resource-specific filters first, then `--filter` terms.
    fn query(&self, scoped: Vec<(&str, Option<String>)>) -> ListQuery {
        let mut query = ListQuery::new();
        for (field, value) in scoped {
            if let Some(value) = value {
                query = query.filter(field, value);
            }
        }
        for (field, value) in &self.filters {
            query = query.filter(field.as_str(), value.as_str());
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if let Some(order_by) = &self.order_by {
            query = query.order_by(order_by.as_str());
        }
        query
    }
}

#[derive(clap::Args)]
struct GetArgs {
    /// Record ID.
    id: i64,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum FacilityCommand {
    /// List facilities.
    List(ListOptions),
    /// Show one facility and its instruments.
    Get(GetArgs),
}

#[derive(Subcommand)]
enum InstrumentCommand {
    /// List instruments.
    List {
        /// Only instruments of this facility.
        #[arg(long)]
        facility: Option<i64>,
        #[command(flatten)]
        options: ListOptions,
    },
    /// Show one instrument.
    Get(GetArgs),
    /// Create an instrument in a facility.
    Create {
        facility_id: i64,
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Rename an instrument.
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExperimentCommand {
    /// List experiments.
    List(ListOptions),
    /// Show one experiment and its datasets.
    Get(GetArgs),
    /// Create an experiment.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        institution: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Change an experiment's title or description.
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DatasetCommand {
    /// List datasets.
    List {
        /// Only datasets of this experiment.
        #[arg(long = "exp")]
        experiment: Option<i64>,
        #[command(flatten)]
        options: ListOptions,
    },
    /// Show one dataset and its datafiles.
    Get(GetArgs),
    /// Create a dataset in an experiment.
    Create {
        experiment_id: i64,
        description: String,
        /// Instrument the data was collected on.
        #[arg(long)]
        instrument: Option<i64>,
        /// JSON file with parameter sets to attach.
        #[arg(long)]
        params: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Change a dataset's description.
    Update {
        id: i64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DatafileCommand {
    /// List datafiles.
    List {
        /// Only datafiles of this dataset.
        #[arg(long)]
        dataset: Option<i64>,
        #[arg(long)]
        directory: Option<String>,
        #[arg(long)]
        filename: Option<String>,
        #[command(flatten)]
        options: ListOptions,
    },
    /// Show one datafile.
    Get(GetArgs),
    /// Record a datafile's MD5 checksum.
    Update {
        id: i64,
        #[arg(long)]
        md5sum: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration.
    Show,
    /// Save --url, --username and --apikey to the config file.
    Set,
}

/// Run the mytardis CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`. Output
/// is assembled in full before anything is printed, so a failure part-way
/// through (say, on a related list) leaves stdout empty.
pub fn run() -> Result<(), MytardisError> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let Some(command) = cli.command else {
        println!("mytardis {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("A command-line client for the MyTardis REST API.");
        println!();
        println!("Run 'mytardis --help' for usage information.");
        return Ok(());
    };

    let mut config = load_config(&cli.global)?;
    let output = match command {
        Commands::Config { command } => run_config(command, &mut config)?,
        command => {
            let transport = build_transport(&config, cli.global.no_cache);
            let client = Client::new(&config, transport)?;
            dispatch(command, &client)?
        }
    };
    println!("{output}");
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    // A logger may already be installed when embedded; keep that one.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

fn load_config(global: &GlobalArgs) -> Result<Config, MytardisError> {
    let mut config = match global.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::new("", "", ""),
    };
    config.apply_overrides(
        global.url.clone(),
        global.username.clone(),
        global.apikey.clone(),
    );
    Ok(config)
}

fn build_transport(config: &Config, no_cache: bool) -> Box<dyn Transport> {
    let transport = UreqTransport::new();
    if no_cache || !config.cache.enabled {
        return Box::new(transport);
    }
    let cache = match config.cache_path() {
        Some(path) => ResponseCache::open(path, config.cache.expiration()),
        None => ResponseCache::in_memory(config.cache.expiration()),
    };
    Box::new(CachedTransport::new(transport, cache))
}

fn run_config(command: ConfigCommand, config: &mut Config) -> Result<String, MytardisError> {
    match command {
        ConfigCommand::Show => Ok(config.to_string()),
        ConfigCommand::Set => {
            config.save()?;
            let path = config
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            Ok(format!("Settings saved to {path}"))
        }
    }
}

/// Runs one resource command against `client`, returning the text to print.
fn dispatch<T: Transport>(command: Commands, client: &Client<'_, T>) -> Result<String, MytardisError> {
    match command {
        Commands::Api {
            command: ApiCommand::List { json },
        } => Ok(client
            .list_api_endpoints()?
            .render(RenderFormat::from_json_flag(json))),
        Commands::Facility { command } => run_facility(command, client),
        Commands::Instrument { command } => run_instrument(command, client),
        Commands::Experiment { command } => run_experiment(command, client),
        Commands::Dataset { command } => run_dataset(command, client),
        Commands::Datafile { command } => run_datafile(command, client),
        Commands::Config { .. } => Err(MytardisError::InvalidArgument(
            "config commands do not use the API".to_string(),
        )),
    }
}

fn run_facility<T: Transport>(
    command: FacilityCommand,
    client: &Client<'_, T>,
) -> Result<String, MytardisError> {
    match command {
        FacilityCommand::List(options) => {
            list_output(client, ResourceKind::Facility, &options, Vec::new())
        }
        FacilityCommand::Get(args) => get_output(client, ResourceKind::Facility, &args),
    }
}

fn run_instrument<T: Transport>(
    command: InstrumentCommand,
    client: &Client<'_, T>,
) -> Result<String, MytardisError> {
    let kind = ResourceKind::Instrument;
    match command {
        InstrumentCommand::List { facility, options } => list_output(
            client,
            kind,
            &options,
            vec![("facility__id", facility.map(|id| id.to_string()))],
        ),
        InstrumentCommand::Get(args) => get_output(client, kind, &args),
        InstrumentCommand::Create {
            facility_id,
            name,
            json,
        } => {
            let record = client.create(kind, fields::new_instrument(facility_id, &name))?;
            Ok(changed_output(&record, json, "created"))
        }
        InstrumentCommand::Update { id, name, json } => {
            let record = client.update(kind, id, fields::instrument_changes(&name))?;
            Ok(changed_output(&record, json, "updated"))
        }
    }
}

fn run_experiment<T: Transport>(
    command: ExperimentCommand,
    client: &Client<'_, T>,
) -> Result<String, MytardisError> {
    let kind = ResourceKind::Experiment;
    match command {
        ExperimentCommand::List(options) => list_output(client, kind, &options, Vec::new()),
        ExperimentCommand::Get(args) => get_output(client, kind, &args),
        ExperimentCommand::Create {
            title,
            description,
            institution,
            json,
        } => {
            let body =
                fields::new_experiment(&title, description.as_deref(), institution.as_deref());
            let record = client.create(kind, body)?;
            Ok(changed_output(&record, json, "created"))
        }
        ExperimentCommand::Update {
            id,
            title,
            description,
            json,
        } => {
            let body = fields::experiment_changes(title.as_deref(), description.as_deref());
            if body.is_empty() {
                return Err(MytardisError::InvalidArgument(
                    "nothing to update: pass --title and/or --description".to_string(),
                ));
            }
            let record = client.update(kind, id, body)?;
            Ok(changed_output(&record, json, "updated"))
        }
    }
}

fn run_dataset<T: Transport>(
    command: DatasetCommand,
    client: &Client<'_, T>,
) -> Result<String, MytardisError> {
    let kind = ResourceKind::Dataset;
    match command {
        DatasetCommand::List {
            experiment,
            options,
        } => list_output(
            client,
            kind,
            &options,
            vec![("experiments__id", experiment.map(|id| id.to_string()))],
        ),
        DatasetCommand::Get(args) => get_output(client, kind, &args),
        DatasetCommand::Create {
            experiment_id,
            description,
            instrument,
            params,
            json,
        } => {
            let parameter_sets = params.map(read_params).transpose()?;
            let body = fields::new_dataset(experiment_id, &description, instrument, parameter_sets);
            let record = client.create(kind, body)?;
            Ok(changed_output(&record, json, "created"))
        }
        DatasetCommand::Update {
            id,
            description,
            json,
        } => {
            let record = client.update(kind, id, fields::dataset_changes(&description))?;
            Ok(changed_output(&record, json, "updated"))
        }
    }
}

fn run_datafile<T: Transport>(
    command: DatafileCommand,
    client: &Client<'_, T>,
) -> Result<String, MytardisError> {
    let kind = ResourceKind::DataFile;
    match command {
        DatafileCommand::List {
            dataset,
            directory,
            filename,
            options,
        } => list_output(
            client,
            kind,
            &options,
            vec![
                ("dataset__id", dataset.map(|id| id.to_string())),
                ("directory", directory),
                ("filename", filename),
            ],
        ),
        DatafileCommand::Get(args) => get_output(client, kind, &args),
        DatafileCommand::Update { id, md5sum, json } => {
            let record = client.update(kind, id, fields::datafile_changes(&md5sum))?;
            Ok(changed_output(&record, json, "updated"))
        }
    }
}

fn list_output<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    options: &ListOptions,
    scoped: Vec<(&str, Option<String>)>,
) -> Result<String, MytardisError> {
    let set = client.list(kind, &options.query(scoped))?;
    let format = RenderFormat::from_json_flag(options.json);
    if options.all {
        render_all(&set, format)
    } else {
        Ok(set.render(format))
    }
}

/// A record, followed in table mode by its related list if it has one.
fn get_output<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    args: &GetArgs,
) -> Result<String, MytardisError> {
    let record = client.get(kind, args.id)?;
    let format = RenderFormat::from_json_flag(args.json);
    let mut output = record.render(format);
    if format == RenderFormat::Table {
        if let Some(related) = kind.related() {
            let query = ListQuery::new().filter(related.filter, record.id().to_string());
            let children = client.list(related.kind, &query)?;
            output.push_str("\n\n");
            output.push_str(&children.render(format));
        }
        if kind == ResourceKind::DataFile {
            let replicas = record.nested(ResourceKind::Replica, "replicas");
            if !replicas.is_empty() {
                output.push_str("\n\n");
                output.push_str(&records_table(ResourceKind::Replica, &replicas).render());
            }
        }
    }
    Ok(output)
}

fn changed_output(record: &ResourceRecord, json: bool, verb: &str) -> String {
    format!(
        "{}\n{} {} successfully.",
        record.render(RenderFormat::from_json_flag(json)),
        record.kind(),
        verb
    )
}

fn read_params(path: PathBuf) -> Result<Value, MytardisError> {
    let text = fs::read_to_string(&path).map_err(|err| {
        MytardisError::InvalidArgument(format!("cannot read {}: {}", path.display(), err))
    })?;
    serde_json::from_str(&text).map_err(|err| {
        MytardisError::InvalidArgument(format!("{} is not valid JSON: {}", path.display(), err))
    })
}

use anyhow::{bail, Context, Result};
use azctl::azure::auth::{AzureCredentials, TokenSource};
use azctl::azure::client::{format_azure_error, AzureClient};
use azctl::commands::{self, ScaleSetOptions};
use azctl::config::Config;
use azctl::output::{self, OutputFormat};
use azctl::storsimple::{ConfirmLegacyVolumeContainerStatus, StorSimpleClient, StorSimpleContext};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Azure resource strategies and StorSimple migration commands
#[derive(Parser, Debug)]
#[command(name = "azctl", version = azctl::VERSION, about, long_about = None)]
struct Cli {
    /// Azure subscription to use
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Output format for structured results
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Virtual machine scale sets
    #[command(subcommand)]
    Vmss(VmssCommand),
    /// StorSimple device manager operations
    #[command(subcommand)]
    Storsimple(StorSimpleCommand),
    /// Show or change saved settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum VmssCommand {
    /// Show the creation plan and request body without calling Azure
    Plan(ScaleSetArgs),
    /// Create or update a scale set
    Create {
        #[command(flatten)]
        args: ScaleSetArgs,
        /// Skip checking that the network resources already exist
        #[arg(long)]
        skip_dependency_check: bool,
    },
    /// Read a scale set
    Get {
        /// Scale set name
        #[arg(long)]
        name: String,
        /// Resource group (defaults to config, then the scale set name)
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ScaleSetArgs {
    /// Scale set name; other resource names default to it
    #[arg(long)]
    name: String,
    #[arg(short = 'g', long)]
    resource_group: Option<String>,
    #[arg(short, long)]
    location: Option<String>,
    #[arg(long)]
    vnet: Option<String>,
    #[arg(long, default_value = "192.168.0.0/16")]
    vnet_address_prefix: String,
    #[arg(long)]
    subnet: Option<String>,
    #[arg(long, default_value = "192.168.1.0/24")]
    subnet_address_prefix: String,
    #[arg(long)]
    lb: Option<String>,
    /// Load balancer frontend IP configuration (repeatable)
    #[arg(long = "frontend-ip")]
    frontend_ips: Vec<String>,
    #[arg(long)]
    backend_pool: Option<String>,
    /// Availability zone for the frontends (repeatable)
    #[arg(long = "zone")]
    zones: Vec<String>,
    #[arg(long)]
    windows: bool,
    #[arg(long)]
    admin_username: String,
    #[arg(long)]
    admin_password: Option<String>,
    /// Image URN: publisher:offer:sku:version
    #[arg(long, default_value = "Canonical:UbuntuServer:16.04-LTS:latest")]
    image: String,
    #[arg(long, default_value = "Standard_DS1_v2")]
    vm_size: String,
    #[arg(long, default_value_t = 2)]
    instance_count: u32,
    /// Automatic, Manual or Rolling (default Manual)
    #[arg(long)]
    upgrade_mode: Option<String>,
}

impl ScaleSetArgs {
    fn to_options(&self, config: &Config) -> ScaleSetOptions {
        let mut options = ScaleSetOptions::named(&self.name, &self.admin_username);

        if let Some(rg) = self.resource_group.clone().or_else(|| config.resource_group.clone()) {
            options.resource_group = rg;
        }
        options.location = self
            .location
            .clone()
            .unwrap_or_else(|| config.effective_location());
        if let Some(vnet) = &self.vnet {
            options.virtual_network = vnet.clone();
        }
        options.virtual_network_address_prefix = self.vnet_address_prefix.clone();
        if let Some(subnet) = &self.subnet {
            options.subnet = subnet.clone();
        }
        options.subnet_address_prefix = self.subnet_address_prefix.clone();
        if let Some(lb) = &self.lb {
            options.load_balancer = lb.clone();
        }
        if !self.frontend_ips.is_empty() {
            options.frontend_ip_configurations = self.frontend_ips.clone();
        }
        if let Some(pool) = &self.backend_pool {
            options.backend_pool = pool.clone();
        }
        options.zones = self.zones.clone();
        options.is_windows = self.windows;
        options.admin_password = self.admin_password.clone();
        options.image = self.image.clone();
        options.vm_size = self.vm_size.clone();
        options.instance_count = self.instance_count;
        options.upgrade_mode = self.upgrade_mode.clone();

        options
    }
}

#[derive(Subcommand, Debug)]
enum StorSimpleCommand {
    /// Commit or roll back a legacy volume container migration
    ConfirmMigration {
        /// Legacy configuration id returned by the import step
        legacy_config_id: String,
        /// Commit or Rollback (case-insensitive)
        migration_operation: String,
        /// Limit the operation to these legacy data containers
        legacy_container_names: Vec<String>,
        /// Cloud service hosting the device manager
        #[arg(long)]
        cloud_service: Option<String>,
        /// Device manager resource name
        #[arg(long)]
        resource: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the saved configuration
    Show,
    /// Update saved settings
    Set {
        #[arg(long)]
        default_subscription: Option<String>,
        #[arg(long)]
        resource_group: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        storsimple_cloud_service: Option<String>,
        #[arg(long)]
        storsimple_resource: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("azctl started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("azctl").join("azctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".azctl").join("azctl.log");
    }
    PathBuf::from("azctl.log")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _log_guard = match setup_logging(cli.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: logging disabled: {err}");
            None
        }
    };

    if let Err(err) = run(cli).await {
        report_error(&err);
        std::process::exit(1);
    }
}

/// Single place every command failure is reported
fn report_error(err: &anyhow::Error) {
    tracing::error!("Command failed: {:?}", err);
    eprintln!("Error: {}", format_azure_error(err));
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load();

    match cli.command {
        Command::Vmss(command) => run_vmss(command, &cli.subscription, cli.output, &config).await,
        Command::Storsimple(command) => run_storsimple(command, &cli.subscription, &config).await,
        Command::Config(ConfigCommand::Show) => {
            println!("{}", output::render(&config, cli.output)?);
            Ok(())
        }
        Command::Config(ConfigCommand::Set {
            default_subscription,
            resource_group,
            location,
            storsimple_cloud_service,
            storsimple_resource,
        }) => {
            if let Some(subscription) = default_subscription {
                config.subscription_id = Some(subscription);
            }
            if resource_group.is_some() {
                config.resource_group = resource_group;
            }
            if location.is_some() {
                config.location = location;
            }
            if let (Some(cloud_service), Some(resource)) =
                (storsimple_cloud_service, storsimple_resource)
            {
                config.storsimple = Some(StorSimpleContext::new(&cloud_service, &resource));
            }
            config.save()?;
            tracing::info!("Configuration saved");
            println!("{}", output::render(&config, cli.output)?);
            Ok(())
        }
    }
}

fn subscription(cli_subscription: &Option<String>, config: &Config) -> Result<String> {
    let subscription = cli_subscription
        .clone()
        .unwrap_or_else(|| config.effective_subscription());

    if subscription.is_empty() {
        bail!("No Azure subscription configured. Set AZURE_SUBSCRIPTION_ID or use --subscription");
    }

    tracing::info!("Using subscription: {}", subscription);
    Ok(subscription)
}

fn connect(cli_subscription: &Option<String>, config: &Config) -> Result<AzureClient> {
    let subscription = subscription(cli_subscription, config)?;
    let credentials = AzureCredentials::new(TokenSource::from_env());
    AzureClient::new(&subscription, credentials, config.endpoints()?)
}

async fn run_vmss(
    command: VmssCommand,
    cli_subscription: &Option<String>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    match command {
        VmssCommand::Plan(args) => {
            let scale_set = commands::build_scale_set_config(&args.to_options(config))?;
            // Planning never calls Azure, so a placeholder subscription is fine
            let subscription = cli_subscription
                .clone()
                .unwrap_or_else(|| config.effective_subscription());
            let subscription = if subscription.is_empty() {
                "{subscriptionId}".to_string()
            } else {
                subscription
            };

            let plan = commands::plan_scale_set(&scale_set, &subscription);
            println!("{}", output::render(&plan, format)?);
        }
        VmssCommand::Create {
            args,
            skip_dependency_check,
        } => {
            let scale_set = commands::build_scale_set_config(&args.to_options(config))?;
            let client = connect(cli_subscription, config)?;
            let created =
                commands::create_scale_set(&scale_set, &client, !skip_dependency_check).await?;
            println!("{}", output::render(&created, format)?);
        }
        VmssCommand::Get {
            name,
            resource_group,
        } => {
            let options = ScaleSetOptions {
                resource_group: resource_group
                    .or_else(|| config.resource_group.clone())
                    .unwrap_or_else(|| name.clone()),
                ..ScaleSetOptions::named(&name, "")
            };
            let scale_set = commands::build_scale_set_config(&options)?;
            let client = connect(cli_subscription, config)?;

            match scale_set.get(&client).await? {
                Some(found) => println!("{}", output::render(&found, format)?),
                None => bail!(
                    "Scale set not found: {}",
                    scale_set.get_id(&client.subscription_id)
                ),
            }
        }
    }

    Ok(())
}

async fn run_storsimple(
    command: StorSimpleCommand,
    cli_subscription: &Option<String>,
    config: &Config,
) -> Result<()> {
    match command {
        StorSimpleCommand::ConfirmMigration {
            legacy_config_id,
            migration_operation,
            legacy_container_names,
            cloud_service,
            resource,
        } => {
            let context = match (cloud_service, resource, &config.storsimple) {
                (Some(cloud_service), Some(resource), _) => {
                    StorSimpleContext::new(&cloud_service, &resource)
                }
                (None, None, Some(saved)) => saved.clone(),
                _ => bail!(
                    "No StorSimple device manager selected. Pass --cloud-service and --resource \
                     or run 'azctl config set --storsimple-cloud-service ... --storsimple-resource ...'"
                ),
            };

            let client = connect(cli_subscription, config)?;
            let service = StorSimpleClient::new(client, context);

            let command = ConfirmLegacyVolumeContainerStatus {
                legacy_config_id,
                migration_operation,
                legacy_container_names: (!legacy_container_names.is_empty())
                    .then_some(legacy_container_names),
            };

            let message = command.execute(&service).await?;
            print!("{}", message);
        }
    }

    Ok(())
}

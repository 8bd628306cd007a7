use clap::{Args, Parser, Subcommand, ValueEnum};
use prisma_rn_config::batch::{self, InputFormat};
use prisma_rn_config::config::{ConfigError, LOCAL_CONFIG_FILE};
use prisma_rn_config::{region, Assembler, BranchInput, Config, DerivedFields};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "prisma-rn")]
#[command(about = "Remote-network IPSec tunnel config generator for Prisma Access branches")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ./prisma-rn.toml, then ~/.prisma-rn/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: NamingOverrides,
}

/// Per-run overrides for the loaded config
#[derive(Args)]
struct NamingOverrides {
    /// Template name
    #[arg(long)]
    template: Option<String>,
    /// Tenant name
    #[arg(long)]
    tenant: Option<String>,
    /// IKE crypto profile
    #[arg(long)]
    ike_crypto: Option<String>,
    /// IPSec crypto profile
    #[arg(long)]
    ipsec_crypto: Option<String>,
    /// Domain used in peer identities
    #[arg(long)]
    domain: Option<String>,
    /// Use the single-tunnel layout (no backup tunnels)
    #[arg(long)]
    no_backup_support: bool,
}

impl NamingOverrides {
    fn apply(self, config: &mut Config) {
        let naming = &mut config.naming;
        let fields = [
            (self.template, &mut naming.template),
            (self.tenant, &mut naming.tenant),
            (self.ike_crypto, &mut naming.ike_crypto_profile),
            (self.ipsec_crypto, &mut naming.ipsec_crypto_profile),
            (self.domain, &mut naming.domain),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        if self.no_backup_support {
            config.generation.backup_support = false;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate config for a single branch
    Generate {
        /// Branch number
        #[arg(short, long)]
        branch: String,
        /// Region display name (see `regions`)
        #[arg(short, long)]
        region: String,
        /// Primary peer IP, or "dynamic"
        #[arg(long, default_value = "dynamic")]
        peer_ip: String,
        /// Subnets, comma-separated (default: derived from branch number)
        #[arg(long)]
        subnets: Option<String>,
        /// Primary pre-shared key (prompted for when omitted)
        #[arg(long)]
        psk: Option<String>,
        /// SPN name (default: region's SPN)
        #[arg(long)]
        spn: Option<String>,
        /// Add a backup tunnel
        #[arg(long)]
        backup: bool,
        /// Backup peer IP, or "dynamic"
        #[arg(long, default_value = "dynamic")]
        backup_peer_ip: String,
        /// Backup pre-shared key (default: primary key)
        #[arg(long)]
        backup_psk: Option<String>,
    },
    /// Show the subnets and SPN derived for a branch
    Preview {
        /// Branch number
        #[arg(short, long)]
        branch: String,
        /// Region display name
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Generate config for every row of a TOML or JSON file
    Batch {
        /// Input rows (.toml or .json)
        input: PathBuf,
        /// Write config here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a sample input file
    Sample {
        #[arg(short, long, value_enum, default_value_t = SampleFormat::Toml)]
        format: SampleFormat,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List known regions
    Regions,
    /// Generate default config file
    Init {
        /// Destination (default: ./prisma-rn.toml)
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleFormat {
    Toml,
    Json,
}

impl From<SampleFormat> for InputFormat {
    fn from(format: SampleFormat) -> Self {
        match format {
            SampleFormat::Toml => InputFormat::Toml,
            SampleFormat::Json => InputFormat::Json,
        }
    }
}

fn load_config(path: Option<&Path>, overrides: NamingOverrides) -> Result<Config, ConfigError> {
    let mut config = Config::discover(path)?;
    overrides.apply(&mut config);
    Ok(config)
}

fn write_output(path: Option<&Path>, content: &str) -> std::io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only config text
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Generate {
            branch,
            region,
            peer_ip,
            subnets,
            psk,
            spn,
            backup,
            backup_peer_ip,
            backup_psk,
        } => {
            let config = load_config(config_path, cli.overrides)?;
            let psk = match psk {
                Some(psk) => psk,
                None => rpassword::prompt_password("Primary PSK: ")?,
            };
            let input = BranchInput {
                subnets,
                peer_ip,
                backup_enabled: backup,
                backup_peer_ip,
                backup_psk,
                spn,
                ..BranchInput::new(&branch, &region, &psk)
            };

            match Assembler::new(&config).assemble(&input) {
                Ok(block) => print!("{}", block),
                Err(e) => {
                    println!("{}", e.diagnostic_line());
                    error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Preview { branch, region } => {
            let fields = DerivedFields::recompute(&branch, region.as_deref().unwrap_or_default());
            println!("Subnets: {}", fields.subnets);
            match (region, fields.spn) {
                (Some(_), Some(spn)) => println!("SPN: {}", spn),
                (Some(region), None) => println!("SPN: unknown region '{}'", region),
                (None, _) => {}
            }
        }
        Commands::Batch { input, output } => {
            let config = load_config(config_path, cli.overrides)?;
            let rows = batch::load_rows(&input)?;
            let result = batch::run(&config, &rows);

            if !result.issues.is_empty() {
                eprintln!("Errors encountered:");
                for issue in &result.issues {
                    eprintln!("  {}", issue);
                }
            }
            write_output(output.as_deref(), &result.output)?;
        }
        Commands::Sample { format, output } => {
            let content = batch::render_sample(format.into())?;
            write_output(output.as_deref(), &content)?;
        }
        Commands::Regions => {
            for entry in region::all() {
                println!("{:<14} {:<14} {}", entry.display, entry.id, entry.spn);
            }
        }
        Commands::Init { path } => {
            info!("Generating default config...");
            let path = path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
            Config::default().save(&path)?;
            println!("Created default config: {}", path.display());
        }
    }

    Ok(())
}

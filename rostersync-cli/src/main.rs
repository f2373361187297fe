use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;
use rostersync::remote::{CertPolicy, MemberDb, ReqwestTransport};
use rostersync::{Master, SheetReader, SheetWriter, Settings, cleanup};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod status;

#[derive(Parser)]
#[command(name = "rostersync")]
#[command(about = "Keep member list spreadsheets in sync with the membership database", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Update a member list with the current members of its group
    Update {
        /// Path to configuration file (TOML)
        #[arg(short, long, value_name = "CONFIG")]
        config: PathBuf,

        /// Member list to update (xlsx)
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        login: Login,
    },
    /// Read a member list and write it again without contacting the database
    Rewrite {
        /// Path to configuration file (TOML)
        #[arg(short, long, value_name = "CONFIG")]
        config: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Print the members of the configured group as JSON
    Fetch {
        /// Path to configuration file (TOML)
        #[arg(short, long, value_name = "CONFIG")]
        config: PathBuf,

        #[command(flatten)]
        login: Login,
    },
    /// Delete stale files from a scratch directory
    Cleanup {
        #[arg(short, long, value_name = "DIR")]
        dir: PathBuf,

        /// Files older than this many seconds are deleted
        #[arg(long, value_name = "SECONDS", default_value_t = cleanup::DEFAULT_MAX_AGE.as_secs())]
        max_age_secs: u64,
    },
}

#[derive(Args)]
struct Login {
    /// Login email, defaults to `default_mail` of the configuration
    #[arg(short, long, value_name = "EMAIL")]
    user: Option<String>,

    #[arg(short, long, env = "ROSTERSYNC_PASSWORD", hide_env_values = true)]
    password: String,

    /// Additional root certificate (PEM)
    #[arg(long, value_name = "PEM", conflicts_with = "insecure")]
    cert: Option<PathBuf>,

    /// Skip certificate verification
    #[arg(long)]
    insecure: bool,
}

impl Login {
    fn cert_policy(&self) -> CertPolicy {
        match (&self.cert, self.insecure) {
            (_, true) => CertPolicy::Disabled,
            (Some(path), false) => CertPolicy::File(path.clone()),
            (None, false) => CertPolicy::System,
        }
    }

    fn connect(&self, settings: &Settings) -> Result<MemberDb<ReqwestTransport>> {
        let transport =
            ReqwestTransport::new(&self.cert_policy()).context("Failed to set up HTTP client")?;
        let user = self
            .user
            .clone()
            .unwrap_or_else(|| settings.default_contact().to_string());
        let mut db = MemberDb::new(transport, settings.db_url(), user)?;
        db.connect(&self.password)
            .with_context(|| format!("Failed to log in to {}", db.base_url()))?;
        Ok(db)
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Update {
            config,
            file,
            login,
        } => {
            let settings = load_settings(&config)?;
            let db = login.connect(&settings)?;
            let mut master = Master::new(settings, db);
            let result = master.run(&file);
            debug!("Run finished in state {:?}", master.state());
            result.with_context(|| format!("Failed to update {}", file.display()))?;
            status::print_updated(&file, master.backup_path());
        }
        Command::Rewrite {
            config,
            input,
            output,
        } => {
            let settings = load_settings(&config)?;
            let reader = SheetReader::load(&settings, &input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let mut writer = SheetWriter::new(&settings, &reader, &output);
            writer.fill(reader.records())?;
            writer
                .save()
                .with_context(|| format!("Failed to write {}", output.display()))?;
            status::print_rewritten(&input, &output, reader.records().len());
        }
        Command::Fetch { config, login } => {
            let settings = load_settings(&config)?;
            let mut db = login.connect(&settings)?;
            let members = db
                .get_group_members(settings.group_id())
                .with_context(|| format!("Failed to fetch group {}", settings.group_id()))?;
            let attributes: Vec<_> = members.iter().map(|m| m.attributes()).collect();
            println!("{}", serde_json::to_string_pretty(&attributes)?);
        }
        Command::Cleanup { dir, max_age_secs } => {
            let removed = cleanup::sweep(&dir, Duration::from_secs(max_age_secs))
                .with_context(|| format!("Failed to clean {}", dir.display()))?;
            status::print_removed(&dir, &removed);
        }
    }

    Ok(())
}

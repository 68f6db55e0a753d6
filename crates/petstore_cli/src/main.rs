//! Command-line driver for the pet store.
//!
//! # Responsibility
//! - Resolve database and logging settings from flags or environment.
//! - Route every command through `PetProvider` so validation and change
//!   signals apply exactly as for any other caller.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use petstore_core::db::open_db;
use petstore_core::{
    core_version, default_log_level, init_logging, PetAddress, PetProvider, PetQuery, PetValues,
    SqlitePetRepository, GENDER_MALE,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "petstore")]
#[command(about = "Manage the pet catalog stored in a local SQLite file")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "PETSTORE_DB", default_value = "pets.db", global = true)]
    db: PathBuf,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "PETSTORE_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, env = "PETSTORE_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommand),
    /// Print the core library version
    Version,
}

/// Commands that open the database.
#[derive(Subcommand)]
enum StoreCommand {
    /// Print every pet as one JSON line
    List {
        /// SQL sort order, e.g. "name ASC"
        #[arg(long)]
        sort: Option<String>,
    },
    /// Print one pet by id
    Get { id: i64 },
    /// Create a pet
    Insert {
        #[arg(long)]
        name: String,
        /// 0 = unknown, 1 = male, 2 = female
        #[arg(long, allow_negative_numbers = true)]
        gender: i64,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        weight: Option<i64>,
    },
    /// Change the given fields of one pet
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        gender: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        weight: Option<i64>,
    },
    /// Delete the pets at an address (`pets` or `pets/{id}`)
    Delete { address: String },
    /// Insert the sample pet Toto
    InsertDummy,
    /// Delete every pet
    DeleteAll,
    /// Print the content type of an address
    Type { address: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Version => {
            println!("petstore_core {}", core_version());
            return Ok(());
        }
        Commands::Store(command) => command,
    };

    if let Some(log_dir) = cli.log_dir.as_ref() {
        let log_dir = absolute_dir(log_dir)?;
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.to_string_lossy()).context("failed to start logging")?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let provider = PetProvider::new(SqlitePetRepository::try_new(&conn)?);
    info!("event=cli_start module=cli status=ok");

    run(&provider, command)
}

fn run(
    provider: &PetProvider<SqlitePetRepository<'_>>,
    command: StoreCommand,
) -> anyhow::Result<()> {
    match command {
        StoreCommand::List { sort } => {
            let mut query = PetQuery::all();
            if let Some(sort) = sort {
                query = query.sorted_by(sort);
            }
            let mut cursor = provider.query(&PetAddress::Collection, &query)?;
            for row in cursor.rows()? {
                let pet = row?.into_pet()?;
                println!("{}", serde_json::to_string(&pet)?);
            }
        }
        StoreCommand::Get { id } => {
            let address = PetAddress::Item(id);
            let mut cursor = provider.query(&address, &PetQuery::all())?;
            match cursor.collect_pets()?.into_iter().next() {
                Some(pet) => println!("{}", serde_json::to_string_pretty(&pet)?),
                None => bail!("no pet at `{address}`"),
            }
        }
        StoreCommand::Insert {
            name,
            gender,
            breed,
            weight,
        } => {
            let mut values = PetValues::new().name(name).gender(gender);
            if let Some(breed) = breed {
                values = values.breed(breed);
            }
            if let Some(weight) = weight {
                values = values.weight(weight);
            }
            print_inserted(&provider.insert(&PetAddress::Collection, &values)?);
        }
        StoreCommand::Update {
            id,
            name,
            breed,
            gender,
            weight,
        } => {
            let mut values = PetValues::new();
            if let Some(name) = name {
                values = values.name(name);
            }
            if let Some(breed) = breed {
                values = values.breed(breed);
            }
            if let Some(gender) = gender {
                values = values.gender(gender);
            }
            if let Some(weight) = weight {
                values = values.weight(weight);
            }
            if values.is_empty() {
                bail!("nothing to update; pass --name, --breed, --gender or --weight");
            }
            let updated = provider.update(&PetAddress::Item(id), &values, None)?;
            println!("updated {updated}");
        }
        StoreCommand::Delete { address } => {
            let deleted = provider.delete(&PetAddress::resolve(&address), None)?;
            println!("deleted {deleted}");
        }
        StoreCommand::InsertDummy => {
            let values = PetValues::new()
                .name("Toto")
                .breed("Terrier")
                .gender(GENDER_MALE)
                .weight(7);
            print_inserted(&provider.insert(&PetAddress::Collection, &values)?);
        }
        StoreCommand::DeleteAll => {
            let deleted = provider.delete(&PetAddress::Collection, None)?;
            println!("deleted {deleted}");
        }
        StoreCommand::Type { address } => {
            let content_type = provider.get_type(&PetAddress::resolve(&address))?;
            println!("{}", content_type.mime_type());
        }
    }

    Ok(())
}

fn print_inserted(address: &PetAddress) {
    match address.content_uri() {
        Some(uri) => println!("{uri}"),
        None => println!("{address}"),
    }
}

// The logger only accepts absolute directories.
fn absolute_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(dir))
}

use anyhow::{bail, Context};
use clap::Parser;
use vehicle_registry::config::LogFormat;
use vehicle_registry::utils::error::ErrorCategory;
use vehicle_registry::utils::{logger, validation::Validate};
use vehicle_registry::{
    CliConfig, Command, ConfigProvider, Driver, Engine, ExchangeOptions, FromDocument,
    LocalStorage, Passenger, RegistryError, TomlConfig, ToDocument, Vehicle, VehicleDatabase,
    VehicleKind,
};

fn main() {
    let cli = CliConfig::parse();

    // 載入 TOML 配置 (若有指定)，命令列參數優先
    let toml_config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(mut config) => {
                config.apply_overrides(&cli);
                Some(config)
            }
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(exit_code(e.category()));
            }
        },
        None => None,
    };

    let verbose = cli.verbose || toml_config.as_ref().is_some_and(TomlConfig::verbose);
    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        toml_config
            .as_ref()
            .map(TomlConfig::log_format)
            .unwrap_or_default()
    };
    match log_format {
        LogFormat::Compact => logger::init_cli_logger(verbose),
        LogFormat::Json => logger::init_json_logger(verbose),
    }

    tracing::debug!("CLI config: {:?}", cli);

    let result = match &toml_config {
        Some(config) => run(config, &cli.command),
        None => run(&cli, &cli.command),
    };

    if let Err(e) = result {
        match e.downcast_ref::<RegistryError>() {
            Some(registry_error) => {
                tracing::error!(
                    "❌ Command failed: {:#} (Category: {:?})",
                    e,
                    registry_error.category()
                );
                eprintln!("❌ {}", registry_error.user_friendly_message());
                eprintln!("💡 {}", registry_error.recovery_suggestion());
                std::process::exit(exit_code(registry_error.category()));
            }
            None => {
                tracing::error!("❌ Command failed: {:#}", e);
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

fn exit_code(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::System => 1,
        ErrorCategory::Validation => 2,
        ErrorCategory::Record => 3,
        ErrorCategory::Registry => 4,
        ErrorCategory::Configuration => 5,
    }
}

fn run<C: ConfigProvider + Validate>(config: &C, command: &Command) -> anyhow::Result<()> {
    config.validate()?;

    let storage = LocalStorage::new(config.data_dir().to_string());
    let options = ExchangeOptions::from_config(config);
    let mut db = load_store(&storage, config, &options)?;

    match command {
        Command::List => {
            if db.is_empty() {
                println!("(registry is empty)");
            }
            for (id, vehicle) in db.iter() {
                println!("{:>5}  {}", id, vehicle);
            }
        }
        Command::Show { id } => {
            let vehicle = db.get(*id)?;
            let document = serde_json::Value::Object(vehicle.to_document());
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Command::Add { document } => {
            let vehicle = parse_vehicle(document)?;
            let id = vehicle.id();
            db.add(vehicle)?;
            save_store(&storage, config, &options, &db)?;
            println!("✅ Added vehicle #{}", id);
        }
        Command::Update { id, document } => {
            let vehicle = parse_vehicle(document)?;
            db.update(*id, vehicle)?;
            save_store(&storage, config, &options, &db)?;
            println!("✅ Updated vehicle #{}", id);
        }
        Command::Remove { id } => {
            let removed = db.remove(*id)?;
            save_store(&storage, config, &options, &db)?;
            println!("✅ Removed {}", removed);
        }
        Command::Export { to, output } => {
            let name = output.as_deref().unwrap_or(config.store_name());
            let written = db.export_to(&storage, *to, name, &options)?;
            println!(
                "📁 Exported {} vehicles to {}",
                db.len(),
                storage.full_path(&written).display()
            );
        }
        Command::Import { from, source } => {
            let imported =
                VehicleDatabase::import_from(&storage, *from, source.as_deref(), &mut db, &options)?;
            save_store(&storage, config, &options, &db)?;
            println!("✅ Imported {} vehicles", imported);
        }
        Command::Demo => {
            for vehicle in sample_fleet()? {
                db.add(vehicle)?;
            }
            save_store(&storage, config, &options, &db)?;
            println!("✅ Registry now holds {} vehicles", db.len());
        }
    }

    Ok(())
}

/// A store that does not exist yet is an empty registry.
fn load_store<C: ConfigProvider>(
    storage: &LocalStorage,
    config: &C,
    options: &ExchangeOptions,
) -> anyhow::Result<VehicleDatabase> {
    let format = config.format();
    let file_name = format.file_name(config.store_name());

    if !storage.exists(&file_name) {
        tracing::debug!("No store at {}, starting empty", file_name);
        return Ok(VehicleDatabase::new());
    }

    let db = VehicleDatabase::load_from(storage, format, Some(config.store_name()), options)
        .with_context(|| format!("failed to load registry from {}", file_name))?;
    Ok(db)
}

fn save_store<C: ConfigProvider>(
    storage: &LocalStorage,
    config: &C,
    options: &ExchangeOptions,
    db: &VehicleDatabase,
) -> anyhow::Result<()> {
    db.export_to(storage, config.format(), config.store_name(), options)
        .context("failed to save registry")?;
    Ok(())
}

fn parse_vehicle(document: &str) -> anyhow::Result<Vehicle> {
    let value: serde_json::Value =
        serde_json::from_str(document).context("vehicle document is not valid JSON")?;
    let serde_json::Value::Object(map) = value else {
        bail!("vehicle document must be a JSON object");
    };
    Ok(Vehicle::from_document(&map)?)
}

fn sample_fleet() -> vehicle_registry::Result<Vec<Vehicle>> {
    Ok(vec![
        Vehicle::new(
            1,
            "BMW",
            "X5",
            2015,
            Driver::new("Ivan Petrov", 41, "B")?,
            Engine::new(340)?,
            VehicleKind::car(4),
        ),
        Vehicle::new(
            2,
            "Scania",
            "R450",
            2010,
            Driver::new("Sergey Orlov", 52, "C")?,
            Engine::new(450)?,
            VehicleKind::truck(200000.0)?,
        ),
        Vehicle::new(
            3,
            "Honda",
            "CBR600RR",
            2020,
            Driver::new("Anna Smirnova", 29, "A")?,
            Engine::new(120)?,
            VehicleKind::motorcycle("sportbike"),
        ),
        Vehicle::new(
            4,
            "MAN",
            "Lion's City",
            2019,
            Driver::new("Oleg Ivanov", 47, "C")?,
            Engine::new(280)?,
            VehicleKind::bus(vec![
                Passenger::new("Olga", 25, 101)?,
                Passenger::new("Petr", 30, 102)?,
                Passenger::new("Nina", 61, 103)?,
            ])?,
        ),
    ])
}

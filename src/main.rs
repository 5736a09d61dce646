use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use naming::{Convention, DEFAULT_SEPARATOR, Name, builtin};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Convention to use
    #[arg(short, long, default_value = "pipefile", value_parser = parse_convention)]
    convention: &'static Convention,

    /// Separator between top-level fields
    #[arg(short, long, default_value = DEFAULT_SEPARATOR)]
    separator: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a name and print its field values
    Parse {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Build a name from field values
    Render {
        /// Start from an existing name
        #[arg(long, value_name = "NAME")]
        from: Option<String>,

        /// Field values
        #[arg(value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },
    /// Print the fields and pattern of the convention
    Fields,
}

fn parse_convention(s: &str) -> Result<&'static Convention, String> {
    builtin::lookup(s).ok_or_else(|| {
        format!(
            "unknown convention '{s}', expected one of: {}",
            builtin::names().sorted().join(", ")
        )
    })
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let convention = args.convention;

    match args.command {
        Command::Parse { name } => {
            let name = Name::parse_with_separator(convention, &name, &args.separator)?;
            for (field, value) in name.values() {
                println!("{field}={value}");
            }
        }
        Command::Render { from, values } => {
            let mut name = Name::with_separator(convention, &args.separator)?;
            if let Some(from) = from {
                name.set_name(&from)
                    .with_context(|| format!("--from {from}"))?;
            }
            for (field, _) in &values {
                if !convention.has_field(field) {
                    warn!(field = %field, convention = convention.name(), "ignoring unknown field");
                }
            }
            println!("{}", name.get_name_with(values));
        }
        Command::Fields => {
            let pattern = convention.pattern(&args.separator)?;
            println!("convention: {}", convention.name());
            println!("layout: {}", convention.layout().join(args.separator.as_str()));
            for (suffix, delimiter) in convention.suffixes() {
                println!("suffix: {delimiter}{suffix}");
            }
            println!("fields: {}", convention.fields().join(", "));
            println!("pattern: {}", pattern.as_str());
            println!("template: {}", pattern.template());
        }
    }
    Ok(())
}

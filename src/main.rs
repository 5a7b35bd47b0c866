// Thu Feb 12 2026 - Alex

use clap::{Parser, Subcommand};
use colored::Colorize;
use itertools::Itertools;
use std::path::PathBuf;

use typequery::config::EngineConfig;
use typequery::engine::DebuggerEngine;
use typequery::structure::{SymbolResult, Type};
use typequery::utils::logging::LoggingUtils;

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Type and symbol queries over a captured debugging session", long_about = None)]
struct Args {
    /// Session capture file (JSON).
    #[arg(short, long)]
    capture: PathBuf,

    /// Engine configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit raw JSON instead of the formatted report.
    #[arg(long)]
    json: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the canonical layout of module!type.
    Type { module: String, name: String },
    /// Resolve a global module!symbol to its type and address.
    Global { module: String, symbol: String },
    /// Find a local symbol in stack frames inside module!method.
    Locals {
        module: String,
        method: String,
        symbol: String,
    },
    /// Resolve an address (hex or decimal) to its nearest symbol.
    Symname { address: String },
}

fn main() {
    let args = Args::parse();
    if std::env::var_os("RUST_LOG").is_some() {
        typequery::utils::logging::init_from_env();
    } else {
        LoggingUtils::init_logger(LoggingUtils::level_from_verbosity(args.verbose as usize));
    }

    let config = match &args.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{} Failed to load config: {}", "[!]".red(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    if let Err(e) = config.validate() {
        eprintln!("{} Invalid config: {}", "[!]".red(), e);
        std::process::exit(1);
    }

    println!(
        "{} Loading session capture: {}",
        "[*]".blue(),
        args.capture.display()
    );
    let engine = match DebuggerEngine::from_capture_file(&args.capture, config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{} Failed to load capture: {}", "[!]".red(), e);
            std::process::exit(1);
        }
    };

    let outcome = match &args.command {
        Command::Type { module, name } => engine
            .get_type(module, name)
            .map(|built| render_type(&built, args.json)),
        Command::Global { module, symbol } => engine
            .get_global_symbol(module, symbol)
            .map(|result| render_symbols(std::slice::from_ref(&result), args.json)),
        Command::Locals {
            module,
            method,
            symbol,
        } => engine
            .get_local_symbols(module, method, symbol)
            .map(|results| render_symbols(&results, args.json)),
        Command::Symname { address } => match parse_address(address) {
            Some(address) => engine.get_symbol_name(address).map(|name| {
                if args.json {
                    print_json(&name);
                } else {
                    println!(
                        "{} {}!{}+0x{:x}",
                        "[+]".green(),
                        name.module,
                        name.name,
                        name.displacement
                    );
                }
            }),
            None => {
                eprintln!("{} Invalid address: {}", "[!]".red(), address);
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = outcome {
        eprintln!("{} {}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn parse_address(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("{} Failed to serialize output: {}", "[!]".red(), e);
            std::process::exit(1);
        }
    }
}

fn render_type(built: &Type, json: bool) {
    if json {
        print_json(built);
        return;
    }

    let kind = if built.is_enum { "enum" } else { "struct" };
    println!(
        "{} {} {}!{}, 0x{:x} bytes",
        "[+]".green(),
        kind,
        built.module,
        built.name,
        built.size
    );

    for base in &built.base_types {
        println!(
            "    base {} @ 0x{:x}, 0x{:x} bytes",
            base.type_model.name.cyan(),
            base.offset,
            base.type_model.size
        );
        print_fields(&base.type_model, "        ");
    }
    print_fields(built, "    ");

    if let Some(constants) = &built.constants {
        for (name, value) in constants {
            println!("    {} = {}", name.cyan(), value);
        }
    }
}

fn print_fields(built: &Type, indent: &str) {
    for (name, field) in built
        .fields
        .iter()
        .sorted_by_key(|(_, field)| (field.offset, field.bit_field.map(|b| b.bit_offset)))
    {
        let bits = match field.bit_field {
            Some(bit_field) => format!(
                " (bits {}..{})",
                bit_field.bit_offset,
                bit_field.bit_offset + bit_field.bit_length
            ),
            None => String::new(),
        };
        println!(
            "{}+0x{:03x} {} : {}{}",
            indent,
            field.offset,
            name.cyan(),
            field.type_name,
            bits
        );
    }
}

fn render_symbols(results: &[SymbolResult], json: bool) {
    if json {
        print_json(&results);
        return;
    }
    if results.is_empty() {
        println!("{} No matches", "[*]".blue());
        return;
    }
    for result in results {
        println!(
            "{} {} {} @ 0x{:x}",
            "[+]".green(),
            result.type_name.cyan(),
            result.module,
            result.address
        );
    }
}

use clap::{Parser, Subcommand};
use renketsu::prelude::*;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Inspect and normalise node graph documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON list of port-only node type definitions to register before loading
    #[arg(short, long, global = true)]
    types: Option<PathBuf>,

    /// Session configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Load a document and print its nodes, connections and diagnostics
    Inspect { document: PathBuf },
    /// Load a document and save it back out in normalised form
    Roundtrip { input: PathBuf, output: PathBuf },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let mut session = build_session(&cli);

    match &cli.command {
        CliCommand::Inspect { document } => {
            let diagnostics = load(&mut session, document);
            print_graph(session.graph(), 0);
            print_diagnostics(&diagnostics);
        }
        CliCommand::Roundtrip { input, output } => {
            let diagnostics = load(&mut session, input);
            print_diagnostics(&diagnostics);
            session.save(output).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to save '{}': {}", output.display(), e))
            });
            println!(
                "Wrote {} nodes to '{}'",
                session.graph().total_len(),
                output.display()
            );
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter)
        .try_init()
    {
        eprintln!("Failed to initialize tracing: {}", e);
    }
}

fn build_session(cli: &Cli) -> Session {
    let config = match &cli.config {
        Some(path) => SessionConfig::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read config '{}': {}", path.display(), e))
        }),
        None => SessionConfig::default(),
    };

    let values = ValueRegistry::with_defaults();
    let mut metadata = MetadataRegistry::new();
    if let Some(path) = &cli.types {
        let json = fs::read_to_string(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read types '{}': {}", path.display(), e))
        });
        let count = metadata
            .load_definitions(&json, &values)
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid type definitions: {}", e)));
        tracing::info!(count, path = %path.display(), "Registered node types");
    }

    Session::builder()
        .with_registries(metadata, values)
        .with_config(config)
        .build()
}

fn load(session: &mut Session, path: &PathBuf) -> Diagnostics {
    session
        .load(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load '{}': {}", path.display(), e)))
}

fn print_graph(graph: &Graph, depth: usize) {
    let indent = "  ".repeat(depth);
    for node in graph {
        println!(
            "{}{} '{}' ({})",
            indent,
            node.id(),
            node.name(),
            node.type_name()
        );
        for port in node.ports() {
            println!(
                "{}    {} {}: {}",
                indent,
                port.category(),
                port.name(),
                port.value()
            );
        }
        if let Some(network) = node.try_as_network() {
            if let Some(source) = network.source() {
                println!("{}    source: {}", indent, source);
            }
            print_graph(network.graph(), depth + 1);
        }
    }

    for (from, to) in graph.connections().iter() {
        let name = |port: PortRef| graph.port(port).map_or("?", |p| p.name());
        println!(
            "{}{}/{} -> {}/{}",
            indent,
            from.node,
            name(from),
            to.node,
            name(to)
        );
    }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    println!("\n--- Diagnostics ({}) ---", diagnostics.len());
    print!("{}", diagnostics);
}

/// Prints an error message and exits the process.
fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}

//! Host Bridge CLI Application
//!
//! This is the host application for the native interop bridge. It uses the
//! host-bridge library and adds the interactive trigger:
//! - Runs the one-time startup sequence (load → stage context → push context)
//! - Refuses to become interactive if any startup step fails
//! - Invokes the bound native method on explicit user action and displays
//!   the returned text

use anyhow::{Context, Result};
use clap::Parser;
use host_bridge::{Bridge, BridgeConfig, NativeContext};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

mod config;

/// Host Bridge - load a native module and call its bound method
#[derive(Parser, Debug)]
#[command(name = "host-bridge-cli")]
#[command(about = "Load a native library and invoke its bound string method", long_about = None)]
#[command(version)]
struct Args {
    /// Logical name of the native library to load
    #[arg(short, long, value_name = "NAME")]
    library: Option<String>,

    /// Library search path(s) (can be repeated)
    #[arg(long, value_name = "DIR")]
    search_path: Vec<PathBuf>,

    /// Fully qualified declaring type of the bound method
    #[arg(long, value_name = "TYPE", default_value = "com.example.DemoHost")]
    declaring_type: String,

    /// Name of the bound method
    #[arg(long, value_name = "NAME", default_value = "stringFromNative")]
    method: String,

    /// Explicit native symbol (overrides the naming convention)
    #[arg(long, value_name = "SYMBOL")]
    symbol: Option<String>,

    /// Application name placed in the native context
    #[arg(long, value_name = "NAME", default_value = "host-bridge-cli")]
    app_name: String,

    /// Data directory placed in the native context (default: current dir)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Invoke once and exit instead of entering the interactive prompt
    #[arg(long)]
    once: bool,

    /// Print invoke results as JSON
    #[arg(long)]
    json: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Host Bridge CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using bridge library v{}", host_bridge::VERSION);

    let Some((bridge_config, context)) = resolve_config(&args)? else {
        // No input at all - show a quick start instead of an error
        println!("Host Bridge - no library specified");
        println!("\nQuick Start:");
        println!("  host-bridge-cli --library host_bridge_demo_lib --search-path target/debug");
        println!("  host-bridge-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    };

    // Startup sequence. Any failure here aborts before the prompt: a surface
    // that depends on the bridge must never become interactive half-wired.
    let bridge = start_bridge(bridge_config, context)?;

    if args.once {
        let result = bridge.invoke().context("Native invocation failed")?;
        print_result(&result, args.json)?;
        return Ok(());
    }

    interactive_loop(&bridge, args.json)
}

/// Build the bridge configuration and context from a config file or flags
fn resolve_config(args: &Args) -> Result<Option<(BridgeConfig, NativeContext)>> {
    if let Some(config_path) = &args.config {
        log::info!("Loading configuration from: {:?}", config_path);
        let app_config = config::load_config(config_path)?;
        return Ok(Some(app_config.into_parts()));
    }

    let Some(library) = &args.library else {
        return Ok(None);
    };

    let mut bridge_config =
        BridgeConfig::new(library, &args.declaring_type, &args.method);
    for path in &args.search_path {
        bridge_config = bridge_config.add_search_path(path);
    }
    if let Some(symbol) = &args.symbol {
        bridge_config = bridge_config.with_symbol(symbol);
    }

    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let context = NativeContext::new(&args.app_name, data_dir);

    Ok(Some((bridge_config, context)))
}

/// Run the one-time startup sequence: load, stage context, push context
fn start_bridge(bridge_config: BridgeConfig, context: NativeContext) -> Result<Bridge> {
    let mut bridge = Bridge::new(bridge_config);

    print!("Loading library '{}' ... ", bridge.config().library);
    io::stdout().flush()?;
    match bridge.load() {
        Ok(_) => println!("✓"),
        Err(e) => {
            println!("✗");
            return Err(e).context("Failed to load native library");
        }
    }
    println!("  Bound symbol: {}", bridge.config().invoke_symbol());

    print!("Initializing application context ... ");
    io::stdout().flush()?;
    match bridge
        .init_application_context(context)
        .and_then(|_| bridge.init_for_native())
    {
        Ok(_) => println!("✓"),
        Err(e) => {
            println!("✗");
            return Err(e).context("Failed to initialize native context");
        }
    }

    log::debug!("Bridge ready (state: {})", bridge.state());
    Ok(bridge)
}

/// Interactive mode - each trigger performs exactly one native call
fn interactive_loop(bridge: &Bridge, json: bool) -> Result<()> {
    println!("\nBridge ready. Press Enter to invoke, 'q' to quit.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        match line.trim() {
            "" | "invoke" => {
                let result = bridge.invoke().context("Native invocation failed")?;
                print_result(&result, json)?;
            }
            "q" | "quit" | "exit" => break,
            other => println!("Unknown command: '{}' (Enter to invoke, 'q' to quit)", other),
        }
    }

    Ok(())
}

fn print_result(result: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "result": result }));
    } else {
        println!("{}", result);
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

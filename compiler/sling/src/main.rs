//! Sling CLI

mod commands;

use commands::Command;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match commands::parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    let code = match command {
        Command::Run { path, timeout } => commands::run_file(&path, timeout),
        Command::Eval { code, timeout } => commands::run_source(&code, timeout),
        Command::Help => {
            print_usage();
            0
        }
        Command::Version => {
            println!("Sling {}", env!("CARGO_PKG_VERSION"));
            0
        }
    };
    std::process::exit(code);
}

/// Logging is off unless `RUST_LOG` is set; `SLING_LOG_TREE` switches to
/// indented span output.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_err() {
        return;
    }
    let filter = EnvFilter::from_default_env();
    if std::env::var_os("SLING_LOG_TREE").is_some() {
        tracing_subscriber::registry()
            .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    }
}

fn print_usage() {
    println!("Sling scripting runtime");
    println!();
    println!("Usage: sling <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file>           Run a script file");
    println!("  -e <code>            Run inline code");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  --timeout <secs>     Abort the script after this many seconds");
    println!();
    println!("Environment:");
    println!("  RUST_LOG             Log filter (e.g. sling_eval=debug)");
    println!("  SLING_LOG_TREE       Hierarchical span output when set");
    println!();
    println!("Examples:");
    println!("  sling run main.sl");
    println!("  sling run main.sl --timeout 5");
    println!("  sling -e \"print(1 + 2)\"");
}

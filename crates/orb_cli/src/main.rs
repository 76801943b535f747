mod args;
mod commands;

use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() {
    let args = match args::parse_args() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            if e != args::usage() {
                eprintln!("{}", args::usage());
            }
            std::process::exit(2);
        }
    };
    init_logging(args.verbose);

    let result = match args.cmd.as_str() {
        "demo" => commands::demo::run(),
        "stress" => commands::stress::run(args.threads, args.items),
        "info" => commands::info::run(),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!("{}", args::usage());
            std::process::exit(2);
        }
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// `ORB_LOG` takes precedence over `RUST_LOG`; without either only warnings
/// are shown, or debug output with `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("ORB_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

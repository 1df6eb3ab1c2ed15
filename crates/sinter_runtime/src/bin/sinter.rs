//! Sinter CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use sinter_foundation::{Result as VmResult, Value};
use sinter_runtime::{DEFAULT_HEAP_SIZE, Host, HostConfig, VmConfig};
use sinter_vm::Vm;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    program: Option<PathBuf>,
    show_help: bool,
    show_version: bool,
    heap_size: Option<u32>,
    max_steps: Option<u64>,
    seed: Option<u64>,
    // Debug flags
    trace_vm: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_value<T: std::str::FromStr>(
    args: &[String],
    i: &mut usize,
    flag: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    *i += 1;
    let raw = args
        .get(*i)
        .ok_or_else(|| format!("{flag} requires a value"))?;
    raw.parse()
        .map_err(|_| format!("invalid {flag} value: {raw}").into())
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--trace-vm" => config.trace_vm = true,
            "--heap-size" => config.heap_size = Some(parse_value(&args, &mut i, "--heap-size")?),
            "--max-steps" => config.max_steps = Some(parse_value(&args, &mut i, "--max-steps")?),
            "--seed" => config.seed = Some(parse_value(&args, &mut i, "--seed")?),
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => {
                if config.program.is_some() {
                    return Err("only one program may be given".into());
                }
                config.program = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn init_tracing(trace_vm: bool) {
    let default = if trace_vm {
        "warn,sinter_vm=trace,sinter_runtime=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// `hello_world()`, the internal function every host registers first.
fn hello_world(vm: &mut Vm, _args: &[Value]) -> VmResult<Value> {
    vm.heap_mut().string("Hello world!")
}

fn run(args: Vec<String>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }

    if config.show_version {
        println!("sinter {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(config.trace_vm);

    let path = config.program.ok_or("no program given (see --help)")?;
    let image = std::fs::read(&path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;

    let mut vm = VmConfig::new();
    if let Some(steps) = config.max_steps {
        vm = vm.with_step_limit(steps);
    }
    if let Some(seed) = config.seed {
        vm = vm.with_random_seed(seed);
    }
    let host_config = HostConfig::new()
        .with_heap_size(config.heap_size.unwrap_or(DEFAULT_HEAP_SIZE))
        .with_vm(vm);

    let mut host = Host::new(host_config);
    host.register_internal(hello_world)?;

    tracing::debug!(path = %path.display(), bytes = image.len(), "running program");
    let outcome = host.run_image(&image);

    match &outcome.value {
        Some(value) => println!("Program exited with fault {}: {value}", outcome.fault.code()),
        None => println!(
            "Program exited with fault {} ({})",
            outcome.fault.code(),
            outcome.fault
        ),
    }

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_help() {
    println!(
        "\x1b[1mSinter\x1b[0m - SVML bytecode runner

\x1b[1mUSAGE:\x1b[0m
    sinter [OPTIONS] <PROGRAM>

\x1b[1mARGUMENTS:\x1b[0m
    <PROGRAM>    Path to a compiled SVML image

\x1b[1mOPTIONS:\x1b[0m
    -h, --help           Print help information
    -V, --version        Print version information
    --heap-size N        Arena size in bytes (default {DEFAULT_HEAP_SIZE})
    --max-steps N        Halt after N instructions
    --seed N             Seed for math_random

\x1b[1mDEBUG OPTIONS:\x1b[0m
    --trace-vm           Enable VM instruction tracing (overridden by RUST_LOG)

\x1b[1mEXAMPLES:\x1b[0m
    sinter program.svm                   Run a program
    sinter --max-steps 100000 loop.svm   Run with a step limit
    RUST_LOG=sinter_vm=debug sinter a.svm  Run with interpreter logging

Internal function 0 is hello_world(), which returns \"Hello world!\"."
    );
}

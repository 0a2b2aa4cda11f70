use std::env;
use std::fs;
use std::process;

use tin::{format_stack, prelude, NumArray, Repl, Tin, TokenTable, Value};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: tin <file.tin> [options]");
        println!("       tin --repl");
        println!();
        println!("Options:");
        println!("  --stack <values>  Initial stack: comma-separated numbers, or");
        println!("                    [v1,v2,...] for a single array value");
        println!("  --prelude         Install the prelude words (μ, ²) before running");
        println!("  --verbose         Enable debug logging");
        println!("  --repl            Start an interactive session");
        return;
    }

    let verbose = args.contains(&"--verbose".to_string());
    let with_prelude = args.contains(&"--prelude".to_string());
    let repl_mode = args.contains(&"--repl".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "tin=debug" } else { "tin=warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if repl_mode {
        if let Err(e) = Repl::new().run() {
            eprintln!("repl error: {}", e);
            process::exit(1);
        }
        return;
    }

    // Parse initial stack: --stack <values>
    let mut initial = Vec::new();
    if let Some(idx) = args.iter().position(|a| a == "--stack") {
        if idx + 1 < args.len() {
            match parse_stack(&args[idx + 1]) {
                Ok(stack) => initial = stack,
                Err(e) => {
                    eprintln!("bad --stack value: {}", e);
                    process::exit(1);
                }
            }
        }
    }

    let mut filename = None;
    let mut skip_next = false;
    for a in args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if a == "--stack" {
            skip_next = true;
            continue;
        }
        if a.starts_with("--") {
            continue;
        }
        filename = Some(a.clone());
        break;
    }
    let filename = match filename {
        Some(name) => name,
        None => {
            eprintln!("no program file given");
            process::exit(1);
        }
    };

    let source = match fs::read_to_string(&filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("cannot read {}: {}", filename, e);
            process::exit(1);
        }
    };

    let mut table = if with_prelude {
        prelude::table()
    } else {
        TokenTable::new()
    };

    match Tin::with_table(&source, &mut table) {
        Ok(program) => match program.execute(initial) {
            Ok(stack) => println!("{}", format_stack(&stack)),
            Err(e) => {
                eprintln!("runtime error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("compile error: {}", e);
            process::exit(1);
        }
    }
}

/// Parse an initial-stack spec: `1,2.5,3` pushes three scalars,
/// `[1,2,3]` pushes one array.
fn parse_stack(spec: &str) -> Result<Vec<Value>, String> {
    let spec = spec.trim();
    if let Some(inner) = spec.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let items = parse_scalars(inner)?;
        let arr = NumArray::from_values(&items).map_err(|e| e.to_string())?;
        return Ok(vec![Value::Array(arr)]);
    }
    parse_scalars(spec)
}

fn parse_scalars(spec: &str) -> Result<Vec<Value>, String> {
    spec.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            if let Ok(n) = s.parse::<i64>() {
                Ok(Value::Int(n))
            } else if let Ok(x) = s.parse::<f64>() {
                Ok(Value::Float(x))
            } else {
                Err(format!("`{}` is not a number", s))
            }
        })
        .collect()
}

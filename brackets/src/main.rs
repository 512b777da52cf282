use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

mod grammar;

#[derive(Parser)]
#[command(version, about = "Parse text with a demonstration grammar and print the final state as JSON")]
struct CliArgs {
    /// Text to parse. Read from stdin when neither this nor --file is given.
    input: Option<String>,
    #[arg(short, long, conflicts_with = "input")]
    file: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = Grammar::Nested)]
    grammar: Grammar,
    #[arg(short, long)]
    pretty: bool,
    /// Fail unless the whole input was consumed.
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Grammar {
    Nested,
    Tokens,
}

impl Grammar {
    fn parser(self) -> parco::core::Parser<String> {
        match self {
            Grammar::Nested => grammar::nested(),
            Grammar::Tokens => grammar::tokens(),
        }
    }
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args = CliArgs::parse();
    let text = read_input(&args)?;
    let state = args.grammar.parser().run(&text);

    let json = if args.pretty {
        serde_json::to_string_pretty(&state)
    } else {
        serde_json::to_string(&state)
    };
    println!("{}", json.map_err(|e| e.to_string())?);

    if args.strict && !state.is_complete() {
        return Err(match state.error() {
            Some(e) => e.to_string(),
            None => format!("unexpected trailing input at index {}", state.position()),
        });
    }
    Ok(())
}

fn read_input(args: &CliArgs) -> Result<String, String> {
    let raw = match (&args.input, &args.file) {
        (Some(input), _) => return Ok(input.clone()),
        (None, Some(file)) => std::fs::read_to_string(file)
            .map_err(|e| format!("Failed to read {}: {e}", file.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read stdin: {e}"))?;
            buffer
        }
    };
    log::debug!("read {} bytes of input", raw.len());
    Ok(raw.trim_end_matches(['\r', '\n']).to_string())
}

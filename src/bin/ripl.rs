//! A read-eval-print loop over stdin, built on top of [`scheme::Interpreter`].

use std::io::{self, BufRead, Write};

use clap::Parser;
use scheme::Interpreter;

/// A REPL for the Scheme subset interpreter.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Prompt string printed before reading each request.
    #[arg(short, long, default_value = "> ")]
    prompt: String,

    /// Suppress the prompt and echo of each result (useful when piping a
    /// script in on stdin).
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if !args.quiet {
            print!("{}", args.prompt);
            let _ = stdout.flush();
        }

        let mut line = String::new();
        let bytes_read = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(err) => {
                tracing::error!(%err, "failed to read from stdin");
                break;
            }
        };
        if bytes_read == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match interpreter.run(&line) {
            Ok(result) => println!("{result}"),
            Err(err) => eprintln!("error: {err}"),
        }
    }
}

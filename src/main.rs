use std::io::BufRead;
use std::process::ExitCode;
use std::sync::mpsc;

use tracing_subscriber::EnvFilter;

use hashkit::{Config, Context, Engine};

const USAGE: &str = "usage: hashkit hash | hashkit verify <encoded> [--rehash]  (password on stdin)";

fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let log_level = std::env::var("HASHKIT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env()?;
    let engine = Engine::new(Some(config))?;

    let code = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["hash"] => {
            let password = read_password()?;
            println!("{}", engine.hash(&password)?);
            ExitCode::SUCCESS
        }
        ["verify", encoded, rest @ ..] => {
            let rehash = rest.contains(&"--rehash");
            let password = read_password()?;
            let (tx, rx) = mpsc::channel::<String>();

            let matched = engine.verify(
                &Context::background(),
                &password,
                encoded,
                rehash,
                Some(Box::new(move |upgraded: String| {
                    let _ = tx.send(upgraded);
                })),
            )?;

            // Drains the queue, so any upgrade is already in the channel.
            engine.shutdown();

            if matched {
                println!("match");
                if let Ok(upgraded) = rx.try_recv() {
                    println!("{upgraded}");
                }
                ExitCode::SUCCESS
            } else {
                println!("mismatch");
                ExitCode::from(1)
            }
        }
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    };

    Ok(code)
}

fn read_password() -> std::io::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

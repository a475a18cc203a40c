//! An interactive chat with a hosted or self-hosted model.

#[macro_use]
extern crate tracing;

mod cli;
mod session;

use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use conclave_model::{ModelBackend, ModelBackendError};
use conclave_openai_model::{HostedBackend, SelfHostedBackend};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

use crate::cli::Args;
use crate::session::Session;

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.model_config();
    let system_prompt = args.system_prompt.as_deref();

    if args.model.is_open_source() {
        let mut builder = SelfHostedBackend::builder(args.model, config);
        if let Some(model_path) = &args.model_path {
            builder = builder.with_model_path(model_path);
        }
        if let Some(server_url) = &args.server_url {
            builder = builder.with_server_url(server_url);
        }
        if let Some(api_key) = &args.api_key {
            builder = builder.with_api_key(api_key);
        }
        match builder.build() {
            Ok(backend) => {
                info!(
                    "chatting with `{}` at {}",
                    backend.model_name(),
                    backend.server_url()
                );
                repl(Session::new(backend, system_prompt)).await;
            }
            Err(err) => {
                report_error(&err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        if args.model_path.is_some() {
            warn!("model path is ignored for managed model {}", args.model);
        }
        let mut builder = HostedBackend::builder(args.model, config);
        match &args.api_key {
            Some(api_key) => builder = builder.with_api_key(api_key),
            None => warn!("no API key is set, requests will likely fail"),
        }
        let backend = builder.build();
        info!("chatting with {} at {}", args.model, backend.base_url());
        repl(Session::new(backend, system_prompt)).await;
    }

    ExitCode::SUCCESS
}

async fn repl<B: ModelBackend>(mut session: Session<B>) {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut lines = io::BufReader::new(io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("error reading input: {}", err);
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        // The spinner stays up until the first delta arrives.
        let mut printing = false;
        let result = session
            .send_message(input, |delta| {
                if !printing {
                    progress_bar.finish_and_clear();
                    print!("{}🤖 ", BAR_CHAR.bright_cyan());
                    printing = true;
                }
                print!("{}", delta.bright_white());
                std::io::stdout().flush().ok();
            })
            .await;
        progress_bar.finish_and_clear();

        match result {
            Ok(_) if printing => println!("\n"),
            Ok(reply) => {
                let bar = BAR_CHAR.bright_cyan();
                println!("{bar}🤖 {}\n", reply.bright_white());
            }
            Err(err) => {
                if printing {
                    println!();
                }
                report_error(&err);
            }
        }
        debug!("{} messages in the conversation", session.history().len());
    }
}

fn report_error<E: ModelBackendError>(err: &E) {
    eprintln!(
        "{}{} {}\n",
        BAR_CHAR.bright_red(),
        format!("{}:", err.kind()).bright_red().bold(),
        err
    );
}

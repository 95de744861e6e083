//! Quill CLI: 供应商配置查看、单次生成与协同写作的命令行工具
//!
//! Usage:
//!   quill-cli providers                          List providers, models and key status
//!   quill-cli generate [--provider <id>] <prompt>  Send one prompt through failover
//!   quill-cli co-write [--provider <id>] <scene>   Plan, decompose and write a scene

use anyhow::{bail, Context};
use quill_ai::{
    CanonicalRequest, CoWriteRequest, ProviderCatalog, Settings, StoryClient, TemperaturePreset,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "providers" | "list" => cmd_providers(),
        "generate" => cmd_generate(&args[2..]).await,
        "co-write" => cmd_co_write(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"quill-cli: Quill AI 命令行工具

USAGE:
    quill-cli <COMMAND> [OPTIONS]

COMMANDS:
    providers                          List providers, models and whether a key is configured
    generate [--provider <id>] <text>  Send one prompt and print the raw reply
    co-write [--provider <id>] <text>  Write a scene with the co-writing pipeline
    version                            Show version information
    help                               Show this help message

ENVIRONMENT:
    QUILL_CONFIG                       Path to a YAML settings file
    OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY
    QUILL_DEFAULT_PROVIDER, QUILL_DEFAULT_MODEL
    RUST_LOG                           Log filter (default: warn)"#
    );
}

fn cmd_version() {
    println!("quill-cli {}", env!("CARGO_PKG_VERSION"));
}

fn load_settings(catalog: &ProviderCatalog) -> anyhow::Result<Settings> {
    let settings = match std::env::var("QUILL_CONFIG") {
        Ok(path) => Settings::from_yaml_file(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        Err(_) => Settings::new(),
    };
    Ok(settings.with_env_overlay(catalog))
}

/// Split `--provider <id>` off the remaining words, which form the text argument.
fn split_args(args: &[String]) -> anyhow::Result<(Option<String>, String)> {
    let mut provider = None;
    let mut words = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--provider" {
            match iter.next() {
                Some(p) => provider = Some(p.clone()),
                None => bail!("--provider needs a value"),
            }
        } else {
            words.push(arg.as_str());
        }
    }
    let text = words.join(" ");
    if text.trim().is_empty() {
        bail!("missing text argument");
    }
    Ok((provider, text))
}

fn cmd_providers() -> anyhow::Result<()> {
    let catalog = ProviderCatalog::builtin();
    let settings = load_settings(&catalog)?;
    for provider in catalog.providers() {
        let status = if settings.is_configured(&provider.id) {
            "configured"
        } else {
            "no key"
        };
        let default_marker = if settings.default_provider.as_deref() == Some(provider.id.as_str())
        {
            " (default)"
        } else {
            ""
        };
        println!(
            "{}: {}{} [{}]",
            provider.id, provider.display_name, default_marker, status
        );
        for model in &provider.models {
            println!(
                "    {:<32} ${:.5}/1k tokens  {} ctx",
                model.model_id, model.cost_per_1k_tokens, model.max_context_tokens
            );
        }
    }
    Ok(())
}

async fn cmd_generate(args: &[String]) -> anyhow::Result<()> {
    let (provider, prompt) = split_args(args)?;
    let catalog = ProviderCatalog::builtin();
    let client = StoryClient::builder()
        .settings(load_settings(&catalog)?)
        .catalog(catalog)
        .build()?;

    let mut request = CanonicalRequest::new(prompt).with_preset(TemperaturePreset::Creative);
    request.preferred_provider = provider;
    let result = client.generate(&request).await?;

    eprintln!("[{} / {}]", result.provider_used, result.model_used);
    println!("{}", result.raw_text);
    Ok(())
}

async fn cmd_co_write(args: &[String]) -> anyhow::Result<()> {
    let (provider, scene) = split_args(args)?;
    let catalog = ProviderCatalog::builtin();
    let client = StoryClient::builder()
        .settings(load_settings(&catalog)?)
        .catalog(catalog)
        .build()?;

    let mut request = CoWriteRequest::new(scene);
    request.preferred_provider = provider;
    let output = client.co_write(&request).await?;

    eprintln!(
        "[{} beats, {} words, providers: {}]",
        output.beats.len(),
        output.word_count(),
        output.providers_used.join(", ")
    );
    println!("{}", output.prose);
    Ok(())
}

use aichat::chat::ChatItem;
use aichat::cli;
use aichat::client::ChatClient;
use aichat::config::ChatConfig;
use aichat::paths;
use anyhow::Context;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();

    let config_path = match &args.config {
        Some(p) => p.clone(),
        None => paths::config_file()?,
    };
    let Some(mut cfg) = ChatConfig::load_optional(&config_path)? else {
        anyhow::bail!(
            "no config found at {} (write one or pass --config)",
            config_path.display()
        );
    };
    tracing::debug!(?config_path, ?cfg, "resolved config");

    if let Some(model) = args.model.clone() {
        cfg.model = model;
    }
    if args.stream {
        cfg.stream = true;
    }
    if args.no_stream {
        cfg.stream = false;
    }
    cfg.validate()?;

    let question = args.question.join(" ");
    if question.trim().is_empty() {
        anyhow::bail!("No question provided. Try: aichat \"Hello\"");
    }

    let client = ChatClient::new(cfg.clone())?;

    if cfg.stream {
        let mut stream = client
            .fragment_stream(&question)
            .await
            .context("failed to start the completion stream")?;

        use std::io::Write;
        use tokio_stream::StreamExt;
        loop {
            tokio::select! {
                next = stream.next() => {
                    let Some(next) = next else { break };
                    let fragment = next.context("stream chunk error")?;
                    print!("{fragment}");
                    std::io::stdout().flush().ok();
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted; dropping the stream");
                    break;
                }
            }
        }
        println!();
    } else {
        let mut item = ChatItem::new(question, cfg.model.clone());
        client.plain_request(&mut item, None).await?;
        println!("{}", item.answer);
    }

    Ok(())
}

//! `taskmate gateway` — Start the HTTP webhook server.

use super::CommandResult;

pub async fn run(port_override: Option<u16>) -> CommandResult {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    // Fail early with setup instructions rather than at the first webhook.
    super::default_provider(&config)?;

    println!("taskmate gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   WhatsApp:  POST /whatsapp");
    println!("   Webhook:   POST /webhook");
    println!(
        "   Signature: {}",
        if config.gateway.shared_secret.is_some() { "required" } else { "off" }
    );

    taskmate_gateway::start(config).await?;

    Ok(())
}

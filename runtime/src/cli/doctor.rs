//! Environment readiness check.

use crate::config::{self, ScreenerConfig};
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check Chromium availability, provider keys, and configured endpoints.
pub async fn run(config: &ScreenerConfig) -> Result<()> {
    println!("Screener Doctor");
    println!("===============");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let chromium = find_chromium(config.chromium_path.as_deref());
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome/Chromium or set SCREENER_CHROMIUM_PATH."
        ),
    }

    for (var, provider) in [("GEMINI_API_KEY", "Gemini"), ("OPENAI_API_KEY", "OpenAI")] {
        if config::api_key_from_env(var).is_some() {
            println!("[OK] {provider} key set ({var})");
        } else {
            println!("[??] {provider} key not set ({var}); `analyze` needs --api-key");
        }
    }

    println!();
    println!("Status page:  {}", config.status_url_template);
    println!("Insider page: {}", config.insider_url_template);
    println!("Gemini:       {} ({})", config.gemini_base_url, config.gemini_model);
    println!("OpenAI:       {} ({})", config.openai_base_url, config.openai_model);

    println!();
    if chromium.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: AI-ONLY");
        println!("  `status` and `insider` need a Chromium binary.");
    }

    Ok(())
}

//! Text-generation provider implementations.
//!
//! # Responsibility
//! - Implement `TextGenerator` against hosted model APIs.
//! - Select a provider from runtime configuration.

pub mod gemini;

use crate::config::DayflowConfig;
use crate::service::briefing::{TextGenerator, UnavailableTextGenerator};
use gemini::GeminiTextGenerator;
use log::{info, warn};

/// Returns the configured generator, or one that always fails (and so
/// always yields fallback messages) when no API key is set.
pub fn text_generator_from_config(config: &DayflowConfig) -> Box<dyn TextGenerator> {
    let Some(api_key) = config.gemini_api_key.as_deref() else {
        info!("event=provider_select module=provider status=ok provider=unavailable");
        return Box::new(UnavailableTextGenerator);
    };

    match GeminiTextGenerator::new(
        api_key,
        config.gemini_model.clone(),
        config.generation_timeout,
    ) {
        Ok(generator) => {
            info!(
                "event=provider_select module=provider status=ok provider=gemini model={}",
                generator.model()
            );
            Box::new(generator)
        }
        Err(err) => {
            warn!("event=provider_select module=provider status=error provider=gemini error={err}");
            Box::new(UnavailableTextGenerator)
        }
    }
}

//! Restyles a product photo after a reference photo.
//!
//! Run with: `cargo run --example restyle -- <product.png> <style.jpg> [keywords]`
//!
//! Requires `API_KEY` (or `GEMINI_API_KEY` / `GOOGLE_API_KEY`).

use photo_studio::{
    CameraPerspective, GeminiClient, GenerationRequest, ImageAsset, LightingStyle, Orchestrator,
    StyleParameters,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> photo_studio::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(product_path), Some(style_path)) = (args.next(), args.next()) else {
        eprintln!("Usage: restyle <product.png> <style.jpg> [keywords]");
        std::process::exit(2);
    };
    let keywords = args.next();

    let orchestrator = Orchestrator::new(Arc::new(GeminiClient::builder().build()?));

    let mut request = GenerationRequest::new(ImageAsset::from_path(&product_path).await?)
        .with_style_image(ImageAsset::from_path(&style_path).await?)
        .with_params(
            StyleParameters::default()
                .with_lighting(LightingStyle::Natural)
                .with_perspective(CameraPerspective::HighAngle),
        );
    if let Some(keywords) = keywords {
        request = request.with_keywords(keywords);
    }

    let result = orchestrator.compose_and_generate(&request).await?;
    let path = result.image.default_file_name();
    let size = result.image.save(&path).await?;
    println!("Prompt:\n{}\n", result.prompt);
    println!("Saved {path} ({size} bytes)");

    Ok(())
}

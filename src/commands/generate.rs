//! Generate static files

use anyhow::Result;

use crate::generator::GenerateStats;
use crate::Blog;

/// Generate the published site from the configured repository
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = blog.generator()?;
    let GenerateStats {
        posts,
        skipped,
        pruned,
    } = generator.generate().await?;

    tracing::info!(
        "Generated {} posts ({} skipped, {} removed)",
        posts,
        skipped,
        pruned
    );

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}

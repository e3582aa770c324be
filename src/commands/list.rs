//! List posts in the content repository

use anyhow::Result;
use chrono_tz::Tz;

use crate::content::{ContentLoader, Post, PreviewContext};
use crate::helpers::publication_date;
use crate::prismic::ContentSource;
use crate::Blog;

/// Print every published post
pub async fn run(blog: &Blog) -> Result<()> {
    let client = blog.client()?;
    for line in post_lines(blog, &client).await? {
        println!("{}", line);
    }
    Ok(())
}

async fn post_lines<C: ContentSource>(blog: &Blog, source: &C) -> Result<Vec<String>> {
    let loader = ContentLoader::new(source, &blog.config.prismic);
    let ctx = loader.pin(&PreviewContext::published()).await?;
    let posts = loader.load_all(&ctx).await?;
    let tz = blog.config.tz();

    let mut lines = Vec::with_capacity(posts.len() + 1);
    lines.push(format!("Posts ({}):", posts.len()));
    lines.extend(posts.iter().map(|post| format_post(post, tz)));
    Ok(lines)
}

fn format_post(post: &Post, tz: Tz) -> String {
    let date = post
        .first_publication_date
        .map(|d| publication_date(&d.with_timezone(&tz)))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "  {} - {} [{}]",
        date,
        post.data.title.as_deref().unwrap_or(""),
        post.uid.as_deref().unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::memory::{doc, MemorySource};

    #[tokio::test]
    async fn test_post_lines() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::with_config(dir.path(), Default::default());
        let source = MemorySource::new(vec![doc("p1", "2021-03-01"), doc("p2", "2021-03-02")]);

        let lines = post_lines(&blog, &source).await.unwrap();
        assert_eq!(
            lines,
            vec![
                "Posts (2):",
                "  01 mar 2021 - Post p1 [p1]",
                "  02 mar 2021 - Post p2 [p2]",
            ]
        );
    }

    #[test]
    fn test_format_post_without_date() {
        let post = Post::default();
        assert_eq!(format_post(&post, chrono_tz::UTC), "  - -  []");
    }
}

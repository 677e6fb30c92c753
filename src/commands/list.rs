//! List site information

use anyhow::Result;

use crate::content::PostSummary;
use crate::generator::Generator;
use crate::helpers::DateFormatter;
use crate::Blog;

/// List content of the given type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let generator = Generator::new(blog, blog.fetcher()?)?;
            let posts = generator.fetch_summaries(None).await?;
            let dates = blog.config.date_formatter()?;
            print!("{}", format_posts(&posts, &dates));
        }
        "route" | "routes" => {
            let generator = Generator::new(blog, blog.fetcher()?)?;
            let posts = generator.fetch_summaries(None).await?;
            let helpers = generator.renderer().helpers();
            println!("Routes ({}):", posts.len() + 1);
            println!("  {}", helpers.url_for("/"));
            for post in &posts {
                println!("  {}", helpers.post_url(&post.id));
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    }

    Ok(())
}

fn format_posts(posts: &[PostSummary], dates: &DateFormatter) -> String {
    let mut out = format!("Posts ({}):\n", posts.len());
    for post in posts {
        out.push_str(&format!(
            "  {}  {}  [{}]\n",
            dates.format_or_placeholder(post.first_publication_date.as_deref(), false),
            post.title,
            post.id
        ));
    }
    out
}

//! Command-line entry point: train the topic model, scan the blog, print the
//! topics of every post.
//!
//! ```sh
//! blog_topics --json-output ./report.json
//! ```

use blog_topics::cli::Cli;
use blog_topics::config::Config;
use blog_topics::models::{ArticleReport, Blog, FailurePolicy};
use blog_topics::outputs::{console, json};
use blog_topics::scrapers::HttpFetcher;
use blog_topics::topics::TopicModel;
use blog_topics::topics::corpus::{NewsgroupsDir, NewsgroupsDownload};
use blog_topics::utils::ensure_parent_writable;
use clap::Parser;
use std::error::Error;
use std::io;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("blog_topics starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");
    let config = Config::from_cli(&args).await?;

    // Fail before the long training run if the report cannot be written.
    if let Some(path) = &args.json_output {
        ensure_parent_writable(path).await?;
    }

    let fetcher = HttpFetcher::new(&config.http)?;

    // ---- Topic model ----
    println!("Creating LDA Model:");
    let model = match &config.corpus.local_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Training from local 20news-bydate tree");
            let source = NewsgroupsDir::new(dir, config.model.seed);
            TopicModel::train_from_source(&source, &config.model).await?
        }
        None => {
            let source = NewsgroupsDownload::new(
                fetcher.clone(),
                &config.corpus.train_url,
                &config.corpus.test_url,
                config.corpus.resolved_cache_dir(),
                config.model.seed,
            );
            TopicModel::train_from_source(&source, &config.model).await?
        }
    };
    println!("LDA Model successfully built !\n");

    // ---- Blog ----
    println!("initiating blog:");
    let mut blog = Blog::new(&config.blog.name, &config.blog.url);
    let links = blog.scan_index(&fetcher, &config.blog.index_selector).await?;
    let policy = if args.keep_going {
        FailurePolicy::Skip
    } else {
        FailurePolicy::Abort
    };
    let skipped = blog
        .fetch_articles(&fetcher, &links, &config.blog.body_selector, policy)
        .await?;
    println!("Blog {} successfully built !\n", blog.name);

    // ---- Classification ----
    let mut reports = Vec::with_capacity(blog.articles.len());
    {
        let mut stdout = io::stdout().lock();
        for article in &blog.articles {
            let topics = model.main_topics(&article.body);
            console::write_article_topics(&mut stdout, &article.title, &topics)?;
            reports.push(ArticleReport {
                url: article.url.clone(),
                title: article.title.clone(),
                topics,
            });
        }
    }

    if let Some(path) = &args.json_output {
        let report = json::build_report(&blog, reports);
        json::write_report(&report, path).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = blog.articles.len(),
        skipped,
        "Execution complete"
    );
    Ok(())
}

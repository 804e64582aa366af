//! Command-line interface definitions.
//!
//! Every flag is optional: with no arguments the tool scans the default blog
//! and trains the default model. Flags override values from the config file.

use clap::Parser;
use std::path::PathBuf;

/// Scrape a blog and report the LDA topics of each post.
///
/// # Examples
///
/// ```sh
/// # Reference run
/// blog_topics
///
/// # Use an already extracted 20news-bydate tree and write a JSON report
/// blog_topics --corpus-dir ~/scikit_learn_data/20news_home --json-output report.json
///
/// # Different blog, skip posts that fail to scrape
/// blog_topics --blog-name "Example" --blog-url https://blog.example.com/ --keep-going
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "BLOG_TOPICS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Display name of the blog
    #[arg(long)]
    pub blog_name: Option<String>,

    /// Index page of the blog to scan
    #[arg(long)]
    pub blog_url: Option<String>,

    /// Extracted 20news-bydate directory to train from instead of downloading
    #[arg(long)]
    pub corpus_dir: Option<PathBuf>,

    /// Directory for downloaded corpus files
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Seed for corpus shuffling and model training
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the run report as JSON to this file
    #[arg(short, long)]
    pub json_output: Option<PathBuf>,

    /// Skip posts that fail to download or parse instead of aborting
    #[arg(long)]
    pub keep_going: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_arguments() {
        let cli = Cli::parse_from(["blog_topics"]);
        assert!(cli.blog_url.is_none());
        assert!(cli.json_output.is_none());
        assert!(!cli.keep_going);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "blog_topics",
            "-c",
            "/tmp/config.yaml",
            "-j",
            "/tmp/report.json",
            "--keep-going",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.yaml")));
        assert_eq!(cli.json_output, Some(PathBuf::from("/tmp/report.json")));
        assert!(cli.keep_going);
    }

    #[test]
    fn test_cli_seed_must_be_numeric() {
        let result = Cli::try_parse_from(["blog_topics", "--seed", "abc"]);
        assert!(result.is_err());
    }
}

//! Plain-text topic listing printed for each article.
//!
//! ```text
//! Article: Web scraping at scale
//! Score: 0.8123	 Topic: 0.021*"crawl" + 0.017*"page" + ...
//! ```

use crate::models::TopicScore;
use crate::topics::format_topic;
use std::io::{self, Write};

pub fn write_article_topics<W: Write>(
    out: &mut W,
    title: &str,
    topics: &[TopicScore],
) -> io::Result<()> {
    writeln!(out, "\nArticle: {title}")?;
    for topic in topics {
        writeln!(
            out,
            "Score: {}\t Topic: {}",
            topic.score,
            format_topic(&topic.terms)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_format() {
        let topics = vec![
            TopicScore {
                topic_id: 2,
                score: 0.75,
                terms: vec![("crawl".to_string(), 0.021), ("page".to_string(), 0.017)],
            },
            TopicScore {
                topic_id: 0,
                score: 0.25,
                terms: vec![("space".to_string(), 0.03)],
            },
        ];
        let mut out = Vec::new();
        write_article_topics(&mut out, "Scaling spiders", &topics).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "\nArticle: Scaling spiders\n\
             Score: 0.75\t Topic: 0.021*\"crawl\" + 0.017*\"page\"\n\
             Score: 0.25\t Topic: 0.030*\"space\"\n"
        );
    }

    #[test]
    fn test_listing_without_topics() {
        let mut out = Vec::new();
        write_article_topics(&mut out, "Empty", &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\nArticle: Empty\n");
    }
}

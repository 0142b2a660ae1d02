// src/pipeline/capper.rs

//! Corpus ordering and size capping.

use std::collections::HashSet;

use crate::models::{Article, Corpus};
use crate::utils::time::{DEFAULT_CREATED, sort_key};

/// Default ceiling on published articles.
pub const MAX_ARTICLES: usize = 150;

/// Sort articles newest first. Missing timestamps get the sentinel default.
pub fn sort_articles(articles: &mut [Article]) {
    for article in articles.iter_mut() {
        if article.created.trim().is_empty() {
            log::warn!(
                "Article \"{}\" by {} has no time, using {}",
                article.title,
                article.author,
                DEFAULT_CREATED
            );
            article.created = DEFAULT_CREATED.to_string();
        }
    }

    articles.sort_by_cached_key(|a| std::cmp::Reverse(sort_key(&a.created)));
}

/// Bound a sorted corpus to `max` articles, keeping later articles from any
/// author who already appears in the head.
pub fn cap_corpus(corpus: &mut Corpus, max: usize) {
    if corpus.articles.len() > max {
        let tail = corpus.articles.split_off(max);
        let head_authors: HashSet<String> =
            corpus.articles.iter().map(|a| a.author.clone()).collect();

        let before = tail.len();
        corpus
            .articles
            .extend(tail.into_iter().filter(|a| head_authors.contains(&a.author)));

        log::info!(
            "Capped corpus at {} article(s), kept {} of {} beyond the cap",
            max,
            corpus.articles.len() - max,
            before
        );
    }

    corpus.refresh_count();
}

/// Sort then cap, as done before publishing.
pub fn sort_and_cap(corpus: &mut Corpus, max: usize) {
    sort_articles(&mut corpus.articles);
    cap_corpus(corpus, max);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(n: usize, author: &str) -> Article {
        Article {
            title: format!("Post {n}"),
            created: format!("2024-01-{:02} 12:00", 28 - n % 28),
            link: format!("https://{author}.example/{n}"),
            author: author.to_string(),
            avatar: String::new(),
        }
    }

    fn corpus_of(articles: Vec<Article>) -> Corpus {
        let mut corpus = Corpus {
            articles,
            ..Corpus::default()
        };
        corpus.refresh_count();
        corpus
    }

    #[test]
    fn test_sort_substitutes_sentinel() {
        let mut articles = vec![
            Article {
                created: String::new(),
                ..article(1, "a")
            },
            Article {
                created: "2025-02-01 10:00".into(),
                ..article(2, "b")
            },
            Article {
                created: "2023-06-01 10:00".into(),
                ..article(3, "c")
            },
        ];

        sort_articles(&mut articles);

        assert_eq!(articles[0].author, "b");
        assert_eq!(articles[1].created, DEFAULT_CREATED);
        assert_eq!(articles[2].author, "c");
    }

    #[test]
    fn test_outsider_beyond_cap_is_dropped() {
        let mut articles: Vec<Article> = (0..150).map(|n| article(n, "head")).collect();
        articles.push(article(150, "outsider"));
        let mut corpus = corpus_of(articles);

        cap_corpus(&mut corpus, MAX_ARTICLES);

        assert_eq!(corpus.articles.len(), 150);
        assert_eq!(corpus.statistics.article_num, 150);
    }

    #[test]
    fn test_head_author_beyond_cap_is_kept() {
        let mut articles: Vec<Article> = (0..150).map(|n| article(n, "head")).collect();
        articles.push(article(150, "head"));
        let mut corpus = corpus_of(articles);

        cap_corpus(&mut corpus, MAX_ARTICLES);

        assert_eq!(corpus.articles.len(), 151);
        assert_eq!(corpus.statistics.article_num, 151);
    }

    #[test]
    fn test_small_corpus_untouched() {
        let mut corpus = corpus_of(vec![article(1, "a"), article(2, "b")]);
        cap_corpus(&mut corpus, MAX_ARTICLES);
        assert_eq!(corpus.articles.len(), 2);
    }
}

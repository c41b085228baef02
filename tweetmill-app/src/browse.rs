use crate::cli::BrowseArgs;
use anyhow::Result;
use tweetmill_common::jsonfile;
use tweetmill_config::CleanerConfig;
use tweetmill_social::twitter::CleanTweetRecord;
use tweetmill_social::twitter::browse::BrowseQuery;

/// Content longer than this is cut in the listing.
const PREVIEW_CHARS: usize = 100;

pub fn run(cfg: &CleanerConfig, args: BrowseArgs) -> Result<()> {
    let input = args.input.unwrap_or_else(|| cfg.output.clone());
    let records: Vec<CleanTweetRecord> = jsonfile::read(&input)?;

    let query = BrowseQuery {
        text: args.query,
        min_likes: args.min_likes,
        since: args.since,
        until: args.until,
        authors: args.authors,
        order: args.order,
    };
    let hits = query.apply(&records);
    tracing::debug!(total = records.len(), shown = hits.len(), order = %query.order, "browse.query");

    if args.json {
        println!("{}", jsonfile::to_string_indented(&hits)?);
        return Ok(());
    }

    println!("Showing {} of {} tweets", hits.len(), records.len());
    for rec in hits {
        println!();
        print!("{}", render(rec));
    }
    Ok(())
}

fn render(rec: &CleanTweetRecord) -> String {
    format!(
        "{} {} · {}\n{}\nlikes {} · bookmarks {} · reposts {}\n{}\n",
        rec.username,
        rec.handle(),
        rec.created_at,
        preview(&rec.content),
        rec.likes,
        rec.bookmarks,
        rec.reposts,
        rec.tweet_url,
    )
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

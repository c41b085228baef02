use crate::cli::CleanArgs;
use anyhow::{Context, Result};
use serde_json::Value;
use tweetmill_common::jsonfile;
use tweetmill_config::CleanerConfig;
use tweetmill_social::twitter::clean::{clean_all, clean_lenient};

pub fn run(cfg: &CleanerConfig, args: CleanArgs) -> Result<()> {
    let input = args.input.unwrap_or_else(|| cfg.input.clone());
    let output = args.output.unwrap_or_else(|| cfg.output.clone());
    let skip_invalid = args.skip_invalid || cfg.skip_invalid;

    let raw: Vec<Value> = jsonfile::read(&input)?;
    tracing::info!(input = %input.display(), count = raw.len(), skip_invalid, "clean.start");

    let records = if skip_invalid {
        let report = clean_lenient(&raw);
        for failure in &report.failures {
            println!("Skipped {failure}");
        }
        report.records
    } else {
        clean_all(&raw).with_context(|| format!("cannot clean {}", input.display()))?
    };

    jsonfile::write_pretty(&output, &records)
        .with_context(|| format!("failed to save {}", output.display()))?;
    println!("{} clean tweets saved to {}", records.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn raw(screen_name: &str) -> Value {
        json!({
            "user": {"legacy": {"profile_image_url_https": "https://pbs.twimg.com/p.jpg", "screen_name": screen_name}},
            "tweet": {
                "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                "favorite_count": 1,
                "bookmark_count": 0,
                "retweet_count": 0,
                "full_text": "hi",
                "conversation_id_str": "1"
            }
        })
    }

    fn args(dir: &Path, skip_invalid: bool) -> CleanArgs {
        CleanArgs {
            input: Some(dir.join("tweets.json")),
            output: Some(dir.join("tweets_clean.json")),
            skip_invalid,
        }
    }

    #[test]
    fn strict_run_writes_nothing_on_bad_record() {
        let dir = tempfile::tempdir().unwrap();
        jsonfile::write_pretty(&dir.path().join("tweets.json"), &vec![raw("a"), json!({"user": {}})]).unwrap();

        let err = run(&CleanerConfig::default(), args(dir.path(), false)).unwrap_err();
        assert!(format!("{err:#}").contains("record 1"));
        assert!(!dir.path().join("tweets_clean.json").exists());
    }

    #[test]
    fn lenient_run_keeps_good_records_reversed() {
        let dir = tempfile::tempdir().unwrap();
        jsonfile::write_pretty(
            &dir.path().join("tweets.json"),
            &vec![raw("a"), json!(null), raw("b")],
        )
        .unwrap();

        run(&CleanerConfig::default(), args(dir.path(), true)).unwrap();
        let out: Vec<Value> = jsonfile::read(&dir.path().join("tweets_clean.json")).unwrap();
        let names: Vec<_> = out.iter().map(|r| r["username"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}

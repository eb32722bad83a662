//! @acp:module "Topics Command"
//! @acp:summary "Write the topic listing of a subject's banks as JSON"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::topics::{math_alevel_topics, math_gcse_topics, science_topics};
use crate::workbook::{Curriculum, Subject, WorkbookCache};

/// Options for the topics command
#[derive(Debug, Clone)]
pub struct TopicsOptions {
    pub subject: String,
    pub curriculum: String,
    /// GCSE math chapters to scan
    pub chapters: Vec<u32>,
    /// Output file; stdout when absent
    pub output: Option<PathBuf>,
}

/// Execute the topics command
pub fn execute_topics(options: TopicsOptions, config: Config) -> Result<()> {
    let subject: Subject = options.subject.parse()?;
    let curriculum: Curriculum = options.curriculum.parse()?;
    let cache = WorkbookCache::new();
    let root = &config.data_root;

    let (listing, entries) = if subject.is_math() {
        match curriculum {
            Curriculum::Gcse => {
                let topics = math_gcse_topics(&cache, root, &options.chapters);
                (serde_json::to_string_pretty(&topics)?, topics.len())
            }
            Curriculum::ALevel => {
                let topics = math_alevel_topics(&cache, root)?;
                (serde_json::to_string_pretty(&topics)?, topics.len())
            }
        }
    } else {
        let topics = science_topics(&cache, root, &subject)?;
        (serde_json::to_string_pretty(&topics)?, topics.len())
    };

    match options.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, listing)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Wrote {} {} entries to {}",
                style("✓").green(),
                entries,
                subject,
                path.display()
            );
        }
        None => println!("{}", listing),
    }

    Ok(())
}

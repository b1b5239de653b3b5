//! GDZ (answer-key) lookup: subject catalog, task-URL composition and
//! scraping of answer images from the composed page.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::info;
use regex::Regex;

use crate::db::Grade;
use crate::dialogue::ChatState;

lazy_static! {
    // Answer scans on the GDZ pages are the img tags whose src mentions
    // "tasks"; everything else on the page is chrome.
    static ref TASK_IMAGE: Regex =
        Regex::new(r#"<img[^>]*\bsrc="([^"]*tasks[^"]*)""#).expect("Task image pattern should be valid");
}

/// Subjects offered in the GDZ keyboard for a grade. Static reference data,
/// aligned with the seeded textbook catalog.
pub fn subjects(grade: Grade) -> &'static [&'static str] {
    match grade {
        Grade::Ninth | Grade::Tenth | Grade::Eleventh => {
            &["Алгебра", "Геометрия", "Физика", "Химия"]
        }
    }
}

/// Normalize a user-entered task number for URL composition. The GDZ site
/// encodes sub-task dots as hyphens ("5.2" lives under "5-2").
pub fn normalize_task_number(task: &str) -> String {
    task.trim().replace('.', "-")
}

/// Compose the answer-page URL from the textbook's stored template.
pub fn compose_task_url(prefix: &str, task: &str, suffix: &str) -> String {
    format!("{}{}{}", prefix, normalize_task_number(task), suffix)
}

/// Extract answer-image links from a fetched GDZ page. The site emits
/// protocol-relative `src` values ("//cdn..."); the two leading slashes are
/// stripped, matching what the bot forwards to the user.
pub fn extract_task_images(html: &str) -> Vec<String> {
    TASK_IMAGE
        .captures_iter(html)
        .map(|caps| {
            let src = &caps[1];
            src.chars().skip(2).collect::<String>()
        })
        .collect()
}

/// Conversation state after serving a task lookup, or `None` to keep the
/// current one. Zero matching images leaves the task prompt active so the
/// user can try another number right away.
pub fn state_after_lookup(image_count: usize) -> Option<ChatState> {
    (image_count > 0).then_some(ChatState::Idle)
}

/// Fetch the composed answer page and scrape the answer-image links.
pub async fn fetch_task_images(client: &reqwest::Client, url: &str) -> Result<Vec<String>> {
    info!("Fetching GDZ page: {url}");
    let html = client
        .get(url)
        .send()
        .await
        .context("GDZ page request failed")?
        .error_for_status()
        .context("GDZ page returned an error status")?
        .text()
        .await
        .context("Failed to read GDZ page body")?;

    let images = extract_task_images(&html);
    info!("Found {} answer image(s) at {url}", images.len());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_number_dots_become_hyphens() {
        assert_eq!(normalize_task_number("5.2"), "5-2");
        assert_eq!(normalize_task_number("12"), "12");
        assert_eq!(normalize_task_number("1.2.3"), "1-2-3");
        assert_eq!(normalize_task_number("  7.1 "), "7-1");
    }

    #[test]
    fn test_compose_task_url() {
        let url = compose_task_url(
            "https://gdz.im/9-klass/algebra/makarychev/zadanie-",
            "5.2",
            "/",
        );
        assert_eq!(url, "https://gdz.im/9-klass/algebra/makarychev/zadanie-5-2/");
    }

    #[test]
    fn test_extract_task_images_filters_and_strips() {
        let html = r#"
            <img src="//cdn.gdz.im/tasks/9/algebra/5-2-1.jpg" alt="">
            <img class="logo" src="//cdn.gdz.im/static/logo.png">
            <img src="//cdn.gdz.im/tasks/9/algebra/5-2-2.jpg">
        "#;
        assert_eq!(
            extract_task_images(html),
            vec![
                "cdn.gdz.im/tasks/9/algebra/5-2-1.jpg".to_string(),
                "cdn.gdz.im/tasks/9/algebra/5-2-2.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_task_images_empty_page() {
        assert!(extract_task_images("<html><body>404</body></html>").is_empty());
    }

    #[test]
    fn test_empty_lookup_keeps_task_prompt_active() {
        assert_eq!(state_after_lookup(0), None);
        assert_eq!(state_after_lookup(1), Some(ChatState::Idle));
        assert_eq!(state_after_lookup(3), Some(ChatState::Idle));
    }

    #[test]
    fn test_subjects_cover_all_grades() {
        for grade in Grade::ALL {
            assert!(!subjects(grade).is_empty());
        }
    }
}

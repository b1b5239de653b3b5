use anyhow::Result;
use tempfile::NamedTempFile;

use shkolnik::db::{Grade, Repository};

fn setup_test_repo() -> Result<(Repository, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let repo = Repository::open(temp_file.path().to_str().unwrap())?;
    Ok((repo, temp_file))
}

/// Every grade in the fixed set registers a never-before-seen user with
/// exactly that grade.
#[tokio::test]
async fn test_registration_for_each_grade() -> Result<()> {
    let (repo, _temp_file) = setup_test_repo()?;

    for (i, grade) in Grade::ALL.into_iter().enumerate() {
        let user_id = 1000 + i as i64;
        assert!(repo.find_user(user_id).await?.is_none());

        repo.add_user(user_id, grade).await?;

        let user = repo.find_user(user_id).await?.expect("user registered");
        assert_eq!(user.grade, grade);
    }
    Ok(())
}

/// Repeated grade selection overwrites the stored grade rather than
/// creating a second record.
#[tokio::test]
async fn test_repeated_selection_overwrites() -> Result<()> {
    let (repo, _temp_file) = setup_test_repo()?;

    repo.add_user(42, Grade::Ninth).await?;
    repo.update_user_grade(42, Grade::Tenth).await?;
    repo.update_user_grade(42, Grade::Eleventh).await?;

    let user = repo.find_user(42).await?.expect("user exists");
    assert_eq!(user.grade, Grade::Eleventh);
    assert_eq!(repo.grade_of(42).await?, Some(Grade::Eleventh));
    Ok(())
}

/// Text outside the fixed {9, 10, 11} set is never a grade selection.
#[test]
fn test_non_grade_text_is_not_a_selection() {
    for text in ["8", "12", "1 0", "девятый", "9a", " 9", ""] {
        assert_eq!(Grade::parse(text), None, "{text:?} must not parse");
    }
}

/// The cached search query is per user and survives unrelated updates.
#[tokio::test]
async fn test_cached_query_is_per_user() -> Result<()> {
    let (repo, _temp_file) = setup_test_repo()?;

    repo.add_user(1, Grade::Ninth).await?;
    repo.add_user(2, Grade::Ninth).await?;

    repo.set_cached_query(1, "https://a,https://b,https://c").await?;
    assert_eq!(repo.cached_query(2).await?, None);

    repo.update_user_grade(1, Grade::Tenth).await?;
    assert_eq!(
        repo.cached_query(1).await?.as_deref(),
        Some("https://a,https://b,https://c")
    );

    repo.clear_cached_query(1).await?;
    assert_eq!(repo.cached_query(1).await?, None);
    Ok(())
}

/// The textbook catalog is keyed by grade and subject; each entry carries
/// a usable URL template.
#[tokio::test]
async fn test_textbook_catalog_lookup() -> Result<()> {
    let (repo, _temp_file) = setup_test_repo()?;

    for grade in Grade::ALL {
        let books = repo.textbooks(grade, "Алгебра").await?;
        assert!(!books.is_empty(), "grade {grade} must have algebra books");

        for book in &books {
            let (prefix, suffix) = repo
                .textbook_url(grade, book)
                .await?
                .expect("listed book must have a url template");
            assert!(prefix.starts_with("http"));
            assert!(!suffix.is_empty());
        }
    }
    Ok(())
}

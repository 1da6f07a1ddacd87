use clapboard_core::db::open_db_in_memory;
use clapboard_core::{
    ErrorKind, Profile, ProfileRepository, SqliteProfileRepository, SqliteStoryRepository, Story,
    StoryRepository, TimestampInput,
};
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;

fn seed_author(conn: &Connection, handle: &str) -> Profile {
    let repo = SqliteProfileRepository::try_new(conn).unwrap();
    let author = Profile::new(
        None,
        handle,
        &format!("{handle}@example.com"),
        &"ab".repeat(64),
        &"cd".repeat(32),
    )
    .unwrap();
    repo.insert_profile(&author).unwrap();
    author
}

#[test]
fn insert_and_get_preserves_microseconds() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "writer");
    let repo = SqliteStoryRepository::try_new(&conn).unwrap();

    let story = Story::with_id(
        Uuid::new_v4(),
        author.id(),
        "precise moment",
        Some(TimestampInput::Text("2023-06-15 12:34:56.789012")),
    )
    .unwrap();
    repo.insert_story(&story).unwrap();

    let loaded = repo.get_story_by_id(story.id()).unwrap().unwrap();
    assert_eq!(loaded, story);
    assert_eq!(loaded.published_at().timestamp_subsec_micros(), 789_012);
}

#[test]
fn stories_for_unknown_author_are_rejected_by_the_store() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoryRepository::try_new(&conn).unwrap();

    let orphan = Story::new(Uuid::new_v4(), "no author").unwrap();
    let err = repo.insert_story(&orphan).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert!(err.is_constraint_violation());
}

#[test]
fn by_author_returns_only_that_authors_stories() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_author(&conn, "first");
    let second = seed_author(&conn, "second");
    let repo = SqliteStoryRepository::try_new(&conn).unwrap();

    let a = Story::new(first.id(), "one").unwrap();
    let b = Story::new(first.id(), "two").unwrap();
    let c = Story::new(second.id(), "three").unwrap();
    for story in [&a, &b, &c] {
        repo.insert_story(story).unwrap();
    }

    let ids: HashSet<_> = repo
        .get_stories_by_author_id(first.id())
        .unwrap()
        .into_iter()
        .map(|story| story.id())
        .collect();
    assert_eq!(ids, HashSet::from([a.id(), b.id()]));

    assert_eq!(repo.get_all_stories().unwrap().len(), 3);
    assert!(repo
        .get_stories_by_author_id(Uuid::new_v4())
        .unwrap()
        .is_empty());
}

#[test]
fn content_search_is_case_sensitive_and_literal() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "searcher");
    let repo = SqliteStoryRepository::try_new(&conn).unwrap();

    let upper = Story::new(author.id(), "Hello World").unwrap();
    let lower = Story::new(author.id(), "hello world").unwrap();
    let symbols = Story::new(author.id(), "100% *starred* [tag] done?").unwrap();
    for story in [&upper, &lower, &symbols] {
        repo.insert_story(story).unwrap();
    }

    let hits = repo.get_stories_by_content("World").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), upper.id());

    let hits = repo.get_stories_by_content("*starred*").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), symbols.id());

    assert_eq!(repo.get_stories_by_content("[tag]").unwrap().len(), 1);
    assert_eq!(repo.get_stories_by_content("done?").unwrap().len(), 1);
    assert_eq!(repo.get_stories_by_content("100%").unwrap().len(), 1);

    // A bare wildcard only matches content that literally holds one.
    assert_eq!(repo.get_stories_by_content("*").unwrap().len(), 1);
    assert!(repo.get_stories_by_content("?x").unwrap().is_empty());
    assert!(repo.get_stories_by_content("   ").unwrap().is_empty());
}

#[test]
fn update_rewrites_content_and_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "editor");
    let repo = SqliteStoryRepository::try_new(&conn).unwrap();

    let mut story = Story::new(author.id(), "draft").unwrap();
    repo.insert_story(&story).unwrap();

    story.set_content("final cut").unwrap();
    story
        .set_published_at(Some("2022-12-31 23:59:59.5".into()))
        .unwrap();
    repo.update_story(&story).unwrap();

    let loaded = repo.get_story_by_id(story.id()).unwrap().unwrap();
    assert_eq!(loaded.content(), "final cut");
    assert_eq!(loaded.published_at(), story.published_at());
}

#[test]
fn delete_removes_story() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "deleter");
    let repo = SqliteStoryRepository::try_new(&conn).unwrap();

    let story = Story::new(author.id(), "temporary").unwrap();
    repo.insert_story(&story).unwrap();
    repo.delete_story(story.id()).unwrap();

    assert!(repo.get_story_by_id(story.id()).unwrap().is_none());
    assert!(repo.get_all_stories().unwrap().is_empty());
}

#[test]
fn deleting_author_with_stories_fails_in_the_store() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "anchored");
    let stories = SqliteStoryRepository::try_new(&conn).unwrap();
    stories
        .insert_story(&Story::new(author.id(), "still here").unwrap())
        .unwrap();

    let profiles = SqliteProfileRepository::try_new(&conn).unwrap();
    let err = profiles.delete_profile(author.id()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert!(profiles.get_profile_by_id(author.id()).unwrap().is_some());
}

#[test]
fn comparison_signs_survive_storage_and_search() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "mathfan");
    let repo = SqliteStoryRepository::try_new(&conn).unwrap();

    let story = Story::new(author.id(), "1 < 2 and 3 > 2").unwrap();
    repo.insert_story(&story).unwrap();

    let loaded = repo.get_story_by_id(story.id()).unwrap().unwrap();
    assert_eq!(loaded.content(), "1 < 2 and 3 > 2");

    let hits = repo.get_stories_by_content("1 < 2").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), story.id());
}

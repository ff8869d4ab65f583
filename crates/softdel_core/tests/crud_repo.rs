mod common;

use common::{
    clear_traced, raw_count, test_db, trace_statements, traced_with, User, UserMapping,
};
use softdel_core::{
    CrudRepository, PageRequest, Predicate, RepoError, Sort, SqliteCrudRepository,
};

#[test]
fn plain_delete_removes_rows_physically() {
    let conn = test_db();
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();
    let user = User::new("Ada");
    repo.save(&user).unwrap();

    repo.delete(&user).unwrap();

    assert_eq!(repo.find_by_id(&user.id.unwrap()).unwrap(), None);
    assert_eq!(raw_count(&conn, "users"), 0);
}

#[test]
fn plain_reads_see_marked_rows() {
    let conn = test_db();
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();
    let mut user = User::new("Ada");
    user.removed_at = Some(42);
    repo.save(&user).unwrap();

    let loaded = repo.find_by_id(&user.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.removed_at, Some(42));
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn plain_batch_delete_is_one_statement() {
    let mut conn = test_db();
    trace_statements(&mut conn);
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();
    let users = ["a", "b", "c"].map(User::new);
    repo.save_all(&users).unwrap();

    clear_traced();
    repo.delete_in_batch(&users[..2]).unwrap();

    assert_eq!(traced_with("DELETE").len(), 1);
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn plain_delete_by_id_reports_missing_rows() {
    let conn = test_db();
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();

    let err = repo.delete_by_id(&uuid::Uuid::new_v4()).unwrap_err();

    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[test]
fn find_one_rejects_ambiguous_matches() {
    let conn = test_db();
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();
    repo.save_all(&["Ada", "Alan", "Grace"].map(User::new))
        .unwrap();

    let err = repo.find_one(Predicate::like("name", "A%")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::IncorrectResultSize {
            expected: 1,
            actual: 2
        }
    ));

    let grace = repo
        .find_one(Predicate::eq("name", "Grace".to_string()))
        .unwrap()
        .unwrap();
    assert_eq!(grace.name, "Grace");
}

#[test]
fn find_by_example_matches_set_columns_only() {
    let conn = test_db();
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();
    let mut ada = User::new("Ada");
    ada.email = None;
    repo.save_all(&[ada, User::new("Grace")]).unwrap();

    let example = User {
        id: None,
        name: "Ada".to_string(),
        email: None,
        removed_at: Some(7),
    };
    let found = repo.find_all_by_example(&example).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ada");
}

#[test]
fn sorted_pages_respect_direction() {
    let conn = test_db();
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();
    repo.save_all(&["a", "b", "c", "d", "e"].map(User::new))
        .unwrap();

    let page = repo
        .find_page(&PageRequest::of(0, 2).sorted(Sort::desc("name")))
        .unwrap();

    let names = page
        .content
        .iter()
        .map(|user| user.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["e", "d"]);
    assert_eq!(page.total_pages(), 3);
}

#[test]
fn save_without_id_is_invalid_argument() {
    let conn = test_db();
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();
    let user = User {
        id: None,
        ..User::new("ghost")
    };

    let err = repo.save(&user).unwrap_err();

    assert!(matches!(err, RepoError::InvalidArgument(_)));
    assert_eq!(raw_count(&conn, "users"), 0);
}

#[test]
fn undecodable_rows_are_invalid_data() {
    let conn = test_db();
    conn.execute(
        "INSERT INTO users (id, name) VALUES ('not-a-uuid', 'broken')",
        [],
    )
    .unwrap();
    let repo = SqliteCrudRepository::try_new(&conn, UserMapping).unwrap();

    let err = repo.find_all().unwrap_err();

    assert!(matches!(err, RepoError::InvalidData(_)));
}

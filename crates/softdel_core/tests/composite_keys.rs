mod common;

use common::{
    clear_traced, raw_count, test_db, trace_statements, traced_with, Membership, MembershipId,
    MembershipMapping,
};
use softdel_core::{CrudRepository, PageRequest, RepoError, SoftDeleteRepository};

fn seeded(conn: &rusqlite::Connection) -> SoftDeleteRepository<'_, MembershipMapping> {
    let repo = SoftDeleteRepository::try_new(conn, MembershipMapping).unwrap();
    repo.save_all(&[
        Membership::new(1, 10, "owner"),
        Membership::new(1, 11, "member"),
        Membership::new(2, 10, "member"),
    ])
    .unwrap();
    repo
}

#[test]
fn delete_by_composite_id_marks_only_that_row() {
    let conn = test_db();
    let repo = seeded(&conn);
    let target = MembershipId {
        org_id: 1,
        user_id: 10,
    };

    repo.delete_by_id(&target).unwrap();

    assert_eq!(repo.find_by_id(&target).unwrap(), None);
    assert!(repo
        .find_by_id(&MembershipId {
            org_id: 2,
            user_id: 10,
        })
        .unwrap()
        .is_some());
    assert!(repo
        .exists_by_id(&MembershipId {
            org_id: 1,
            user_id: 11,
        })
        .unwrap());
    assert_eq!(repo.count().unwrap(), 2);
    assert_eq!(raw_count(&conn, "memberships"), 3);
}

#[test]
fn composite_batch_delete_is_one_update() {
    let mut conn = test_db();
    trace_statements(&mut conn);
    let repo = seeded(&conn);
    let batch = [
        Membership::new(1, 11, "member"),
        Membership::new(2, 10, "member"),
    ];

    clear_traced();
    repo.delete_in_batch(&batch).unwrap();

    assert_eq!(traced_with("UPDATE").len(), 1);
    let live = repo.find_all().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(
        live[0].id,
        MembershipId {
            org_id: 1,
            user_id: 10,
        }
    );
}

#[test]
fn find_all_by_composite_ids_skips_removed() {
    let conn = test_db();
    let repo = seeded(&conn);
    repo.delete(&Membership::new(1, 11, "member")).unwrap();

    let found = repo
        .find_all_by_id(&[
            MembershipId {
                org_id: 1,
                user_id: 10,
            },
            MembershipId {
                org_id: 1,
                user_id: 11,
            },
        ])
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].role, "owner");
}

#[test]
fn unsorted_pages_follow_key_order() {
    let conn = test_db();
    let repo = seeded(&conn);

    let page = repo.find_page(&PageRequest::of(1, 2)).unwrap();

    assert_eq!(page.total_elements, 3);
    assert_eq!(page.content.len(), 1);
    assert_eq!(
        page.content[0].id,
        MembershipId {
            org_id: 2,
            user_id: 10,
        }
    );
    assert!(page.has_previous());
    assert!(!page.has_next());
}

#[test]
fn missing_composite_row_is_not_found() {
    let conn = test_db();
    let repo = seeded(&conn);

    let err = repo
        .delete_by_id(&MembershipId {
            org_id: 9,
            user_id: 9,
        })
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound { ref entity, .. } if entity == "Membership"));
}

#[test]
fn batch_over_the_bind_limit_fails_without_marking_rows() {
    let conn = test_db();
    let repo = seeded(&conn);
    let mut batch = (0..150_000)
        .map(|n| Membership::new(100, n, "member"))
        .collect::<Vec<_>>();
    batch.push(Membership::new(1, 10, "owner"));

    let err = repo.delete_in_batch(&batch).unwrap_err();

    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(repo.count().unwrap(), 3);
    assert_eq!(repo.count_removed(None).unwrap(), 0);
    assert!(repo
        .exists_by_id(&MembershipId {
            org_id: 1,
            user_id: 10,
        })
        .unwrap());
}

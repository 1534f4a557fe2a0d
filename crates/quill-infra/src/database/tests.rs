#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::database::entity::{comment, post, tag, user};
    use crate::database::post_repo::{PostgresPostRepository, contains_pattern};
    use crate::database::postgres_repo::{PostgresCommentRepository, PostgresUserRepository};
    use chrono::{NaiveDate, TimeZone, Utc};
    use quill_core::domain::{NewPost, Pagination, Post, PostQuery, PostStatus, User};
    use quill_core::error::RepoError;
    use quill_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn user_model(id: uuid::Uuid, username: &str) -> user::Model {
        let now = Utc::now();
        user::Model {
            id,
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn post_model(id: uuid::Uuid, slug: &str, status: post::Status) -> post::Model {
        let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        post::Model {
            id,
            author_id: uuid::Uuid::new_v4(),
            title: format!("Post {slug}"),
            slug: slug.to_owned(),
            body: "Content".to_owned(),
            publish: publish.into(),
            publish_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            created: publish.into(),
            updated: publish.into(),
            status,
        }
    }

    fn new_post(slug: &str, tags: &[&str]) -> Post {
        Post::new(NewPost {
            author_id: uuid::Uuid::new_v4(),
            title: "Who was Django Reinhardt?".to_owned(),
            slug: Some(slug.to_owned()),
            body: "Content".to_owned(),
            publish: Some(Utc.with_ymd_and_hms(2024, 1, 2, 18, 0, 0).unwrap()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_post_by_id_with_tags() {
        let post_id = uuid::Uuid::new_v4();
        let author_id = uuid::Uuid::new_v4();
        let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

        let tag_row = |name: &str| {
            BTreeMap::from([
                ("post_id", Value::from(post_id)),
                ("name", Value::from(name)),
            ])
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post::Model {
                id: post_id,
                author_id,
                title: "Who was Django Reinhardt?".to_owned(),
                slug: "who-was-django-reinhardt".to_owned(),
                body: "Content".to_owned(),
                publish: publish.into(),
                publish_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                created: publish.into(),
                updated: publish.into(),
                status: post::Status::Published,
            }]])
            .append_query_results([vec![tag_row("guitar"), tag_row("jazz")]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        let post = result.unwrap();
        assert_eq!(post.id, post_id);
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.tags, vec!["guitar", "jazz"]);
        assert_eq!(post.absolute_url(), "/blog/2024/1/2/who-was-django-reinhardt/");
    }

    #[tokio::test]
    async fn test_find_post_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        let result = repo.find_by_id(uuid::Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_post_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        let result = BaseRepository::<Post, uuid::Uuid>::delete(&repo, uuid::Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_find_user_by_username() {
        let id = uuid::Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(id, "django")]])
            .into_connection();

        let repo = PostgresUserRepository::new(db);
        let user = repo.find_by_username("django").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "django@example.com");
    }

    #[tokio::test]
    async fn test_save_new_user_falls_back_to_insert() {
        let user = User::new("django", "django@example.com").unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // UPDATE ... RETURNING matches no row
            .append_query_results([Vec::<user::Model>::new()])
            // INSERT ... RETURNING
            .append_query_results([vec![user_model(user.id, "django")]])
            .into_connection();

        let repo = PostgresUserRepository::new(db);
        let saved: User = repo.save(user.clone()).await.unwrap();
        assert_eq!(saved.id, user.id);
        assert_eq!(saved.username, "django");
    }

    #[tokio::test]
    async fn test_comments_for_post() {
        let post_id = uuid::Uuid::new_v4();
        let now = Utc::now();
        let comment = |name: &str, active: bool| comment::Model {
            id: uuid::Uuid::new_v4(),
            post_id,
            name: name.to_owned(),
            email: "reader@example.com".to_owned(),
            body: "Nice".to_owned(),
            created: now.into(),
            updated: now.into(),
            active,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![comment("Ann", true), comment("Bob", true)]])
            .into_connection();

        let repo = PostgresCommentRepository::new(db);
        let comments = repo.for_post(post_id, true).await.unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].name, "Ann");
        assert!(comments.iter().all(|c| c.active && c.post_id == post_id));
    }

    #[tokio::test]
    async fn test_similar_without_tags_skips_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PostgresPostRepository::new(db);

        let post = Post::new(NewPost {
            author_id: uuid::Uuid::new_v4(),
            title: "Untagged".to_owned(),
            body: "Body".to_owned(),
            ..Default::default()
        })
        .unwrap();

        assert!(repo.similar(&post, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_post_slug_clash_is_constraint() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // Another post already owns the slug on that date
            .append_query_results([vec![post_model(
                uuid::Uuid::new_v4(),
                "who-was-django-reinhardt",
                post::Status::Draft,
            )]])
            .into_connection();

        let repo = PostgresPostRepository::new(db.clone());
        let result = repo.save(new_post("who-was-django-reinhardt", &[])).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("publish_date"));
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn test_save_new_post_links_tags() {
        let post = new_post("gypsy-jazz", &["jazz"]);
        let tag_id = uuid::Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // no slug clash
            .append_query_results([Vec::<post::Model>::new()])
            // not stored yet
            .append_query_results([Vec::<post::Model>::new()])
            // INSERT ... RETURNING
            .append_query_results([vec![post_model(
                post.id,
                "gypsy-jazz",
                post::Status::Draft,
            )]])
            // tag lookup misses, then INSERT ... RETURNING
            .append_query_results([Vec::<tag::Model>::new()])
            .append_query_results([vec![tag::Model {
                id: tag_id,
                name: "jazz".to_owned(),
                slug: "jazz".to_owned(),
            }]])
            // DELETE old links, INSERT new links
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let repo = PostgresPostRepository::new(db.clone());
        let saved = repo.save(post.clone()).await.unwrap();
        assert_eq!(saved.id, post.id);
        assert_eq!(saved.tags, vec!["jazz"]);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("DELETE FROM"));
        assert!(log.contains("post_tags"));
        assert!(log.contains("INSERT INTO"));
    }

    #[tokio::test]
    async fn test_list_published_by_tag_paginated() {
        let first = uuid::Uuid::new_v4();
        let second = uuid::Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // post ids carrying the tag
            .append_query_results([vec![
                BTreeMap::from([("post_id", Value::from(first))]),
                BTreeMap::from([("post_id", Value::from(second))]),
            ]])
            // COUNT(*)
            .append_query_results([vec![BTreeMap::from([(
                "num_items",
                Value::BigInt(Some(2)),
            )])]])
            // the requested page
            .append_query_results([vec![post_model(second, "older", post::Status::Published)]])
            // its tags
            .append_query_results([vec![BTreeMap::from([
                ("post_id", Value::from(second)),
                ("name", Value::from("jazz")),
            ])]])
            .into_connection();

        let repo = PostgresPostRepository::new(db.clone());
        let page = repo
            .list(
                PostQuery::published()
                    .with_tag("jazz")
                    .paginate(Pagination::new(2, 1)),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, second);
        assert_eq!(page.items[0].tags, vec!["jazz"]);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("status"));
        assert!(log.contains("LIMIT"));
        assert!(log.contains("OFFSET"));
        assert!(log.contains("ORDER BY"));
    }

    #[tokio::test]
    async fn test_list_search_matches_literally() {
        assert_eq!(contains_pattern("A_b"), r"%a\_b%");
        assert_eq!(contains_pattern(r"100%\"), r"%100\%\\%");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([(
                "num_items",
                Value::BigInt(Some(0)),
            )])]])
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let repo = PostgresPostRepository::new(db.clone());
        let query = PostQuery {
            status: Some(PostStatus::Draft),
            search: Some("a_b".to_owned()),
            ..Default::default()
        };
        let page = repo.list(query).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("LIKE"));
        assert!(log.contains("ESCAPE"));
    }
}

//! Post entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};

use quill_core::domain::PostStatus;

/// Stored form of [`PostStatus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

impl From<Status> for PostStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => PostStatus::Draft,
            Status::Published => PostStatus::Published,
        }
    }
}

impl From<PostStatus> for Status {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Draft => Status::Draft,
            PostStatus::Published => Status::Published,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(250))")]
    pub title: String,
    #[sea_orm(column_type = "String(StringLen::N(250))")]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub publish: DateTimeWithTimeZone,
    /// Calendar date of `publish`; `(slug, publish_date)` is unique.
    pub publish_date: Date,
    pub created: DateTimeWithTimeZone,
    pub updated: DateTimeWithTimeZone,
    pub status: Status,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTag,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::post_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostTag.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_tag::Relation::Post.def().rev())
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.created = ActiveValue::NotSet;
            self.updated = Set(chrono::Utc::now().into());
        }
        Ok(self)
    }
}

impl Model {
    /// Build the domain post; tags live in the join table and are loaded
    /// separately.
    pub fn into_post(self, tags: Vec<String>) -> quill_core::domain::Post {
        quill_core::domain::Post {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            slug: self.slug,
            body: self.body,
            publish: self.publish.into(),
            created: self.created.into(),
            updated: self.updated.into(),
            status: self.status.into(),
            tags,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel. Tags are not part of
/// the row.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            publish_date: Set(post.publish_date()),
            title: Set(post.title),
            slug: Set(post.slug),
            body: Set(post.body),
            publish: Set(post.publish.into()),
            created: Set(post.created.into()),
            updated: Set(post.updated.into()),
            status: Set(post.status.into()),
        }
    }
}

use super::entities::{question_tag, tag, QuestionTag, Tag};
use crate::domain::TagCount;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct TagRepository {
    db: DatabaseConnection,
}

impl TagRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<tag::Model>, DbErr> {
        find_by_name(&self.db, name).await
    }

    /// Tags with the most questions.
    pub async fn top(&self, limit: u64) -> Result<Vec<TagCount>, DbErr> {
        let counts: Vec<(Uuid, i64)> = QuestionTag::find()
            .select_only()
            .column(question_tag::Column::TagId)
            .column_as(Expr::col(question_tag::Column::QuestionId).count(), "questions_count")
            .group_by(question_tag::Column::TagId)
            .order_by_desc(Expr::col(question_tag::Column::QuestionId).count())
            .order_by_asc(question_tag::Column::TagId)
            .limit(limit)
            .into_tuple()
            .all(&self.db)
            .await?;

        let ids: Vec<Uuid> = counts.iter().map(|(id, _)| *id).collect();
        let names: HashMap<Uuid, String> = Tag::find()
            .filter(tag::Column::Id.is_in(ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        Ok(counts
            .into_iter()
            .filter_map(|(id, questions_count)| {
                names.get(&id).map(|name| TagCount {
                    name: name.clone(),
                    questions_count,
                })
            })
            .collect())
    }

    /// Tag names of each question, sorted, in one query.
    pub async fn names_for_questions(
        &self,
        question_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<String>>, DbErr> {
        if question_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = QuestionTag::find()
            .filter(question_tag::Column::QuestionId.is_in(question_ids.iter().copied()))
            .find_also_related(Tag)
            .all(&self.db)
            .await?;

        let mut names: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (link, tag) in rows {
            if let Some(tag) = tag {
                names.entry(link.question_id).or_default().push(tag.name);
            }
        }
        for list in names.values_mut() {
            list.sort();
        }
        Ok(names)
    }
}

pub(crate) async fn get_or_create<C>(conn: &C, name: &str) -> Result<tag::Model, DbErr>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_by_name(conn, name).await? {
        return Ok(existing);
    }

    // A concurrent request may create the same tag between the lookup and
    // the insert; the insert then does nothing and the lookup below sees it.
    Tag::insert(tag::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    })
    .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
    .do_nothing()
    .exec_without_returning(conn)
    .await?;

    find_by_name(conn, name)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Tag".to_string()))
}

async fn find_by_name<C>(conn: &C, name: &str) -> Result<Option<tag::Model>, DbErr>
where
    C: ConnectionTrait,
{
    Tag::find().filter(tag::Column::Name.eq(name)).one(conn).await
}

use crate::domain::{
    Actor, AnswerWithDetails, Author, Contributor, Page, PageInfo, PageRequest, ProfileDetails,
    QuestionWithDetails, TagCount,
};
use crate::infrastructure::db::entities::{answer, question};
use crate::infrastructure::db::{
    AnswerRepository, QuestionRepository, TagRepository, UserRepository, VoteRepository,
};
use askme_errors::AppError;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use uuid::Uuid;

/// Size of the "popular tags" and "best members" panels.
pub const SIDEBAR_LIMIT: u64 = 5;

#[derive(Debug, Clone)]
pub struct QuestionPage {
    pub question: QuestionWithDetails,
    pub answers: Page<AnswerWithDetails>,
}

#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    pub top_tags: Vec<TagCount>,
    pub top_contributors: Vec<Contributor>,
}

/// Read side of the forum. Everything here reads cached counters and fetches
/// related rows in batches; the viewer, when known, is passed in explicitly.
#[derive(Clone)]
pub struct Feed {
    questions: QuestionRepository,
    answers: AnswerRepository,
    tags: TagRepository,
    users: UserRepository,
    votes: VoteRepository,
    page_size: u64,
}

impl Feed {
    pub fn new(db: DatabaseConnection, page_size: u64) -> Self {
        Self {
            questions: QuestionRepository::new(db.clone()),
            answers: AnswerRepository::new(db.clone()),
            tags: TagRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            votes: VoteRepository::new(db),
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub async fn newest(
        &self,
        viewer: Option<Actor>,
        page: PageRequest,
    ) -> Result<Page<QuestionWithDetails>, AppError> {
        let (rows, info) = self.questions.newest(page, self.page_size).await?;
        self.question_page(rows, info, viewer).await
    }

    pub async fn hottest(
        &self,
        viewer: Option<Actor>,
        page: PageRequest,
    ) -> Result<Page<QuestionWithDetails>, AppError> {
        let (rows, info) = self.questions.hottest(page, self.page_size).await?;
        self.question_page(rows, info, viewer).await
    }

    /// Questions tagged `name`. A tag nobody uses is treated like a missing one.
    pub async fn by_tag(
        &self,
        name: &str,
        viewer: Option<Actor>,
        page: PageRequest,
    ) -> Result<Page<QuestionWithDetails>, AppError> {
        if self.tags.find_by_name(name).await?.is_none() {
            return Err(AppError::not_found("Tag"));
        }
        let (rows, info) = self.questions.by_tag(name, page, self.page_size).await?;
        if info.total_items == 0 {
            return Err(AppError::not_found("Tag"));
        }
        self.question_page(rows, info, viewer).await
    }

    /// The question and one page of its answers, oldest answer first.
    pub async fn question_detail(
        &self,
        question_id: Uuid,
        viewer: Option<Actor>,
        page: PageRequest,
    ) -> Result<QuestionPage, AppError> {
        let row = self
            .questions
            .find_by_id(question_id)
            .await?
            .ok_or_else(|| AppError::not_found("Question"))?;
        let question = self
            .decorate_questions(vec![row], viewer)
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Question lost while loading".to_string()))?;

        let (rows, info) = self
            .answers
            .for_question(question_id, page, self.page_size)
            .await?;
        let items = self.decorate_answers(rows, viewer).await?;

        Ok(QuestionPage {
            question,
            answers: Page { items, info },
        })
    }

    /// Page that holds the last of `answers_count` answers.
    pub fn last_answer_page(&self, answers_count: i32) -> u64 {
        crate::domain::num_pages(u64::try_from(answers_count).unwrap_or(0), self.page_size)
    }

    /// Users ranked by the summed rating of their questions and answers.
    pub async fn top_contributors(&self, limit: u64) -> Result<Vec<Contributor>, AppError> {
        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for (user_id, sum) in self.questions.rating_sums_by_author().await? {
            *totals.entry(user_id).or_default() += sum;
        }
        for (user_id, sum) in self.answers.rating_sums_by_author().await? {
            *totals.entry(user_id).or_default() += sum;
        }

        let mut ranked: Vec<(Uuid, i64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        let ids: Vec<Uuid> = ranked.iter().map(|(id, _)| *id).collect();
        let mut authors = self.users.authors(&ids).await?;

        Ok(ranked
            .into_iter()
            .filter_map(|(id, rating)| {
                authors
                    .remove(&id)
                    .map(|author| Contributor { author, rating })
            })
            .collect())
    }

    pub async fn top_tags(&self, limit: u64) -> Result<Vec<TagCount>, AppError> {
        Ok(self.tags.top(limit).await?)
    }

    pub async fn sidebar(&self) -> Result<Sidebar, AppError> {
        Ok(Sidebar {
            top_tags: self.top_tags(SIDEBAR_LIMIT).await?,
            top_contributors: self.top_contributors(SIDEBAR_LIMIT).await?,
        })
    }

    pub async fn profile(&self, profile_id: Uuid) -> Result<ProfileDetails, AppError> {
        let (profile, user) = self
            .users
            .profile_with_user(profile_id)
            .await?
            .ok_or_else(|| AppError::not_found("Profile"))?;

        let questions_count = self.questions.count_by_author(user.id).await?;
        let answers_count = self.answers.count_by_author(user.id).await?;

        Ok(ProfileDetails {
            profile_id: profile.id,
            user_id: user.id,
            username: user.username,
            email: user.email,
            nickname: profile.nickname,
            avatar: profile.avatar,
            questions_count,
            answers_count,
            joined_at: user.created_at,
        })
    }

    async fn question_page(
        &self,
        rows: Vec<question::Model>,
        info: PageInfo,
        viewer: Option<Actor>,
    ) -> Result<Page<QuestionWithDetails>, AppError> {
        let items = self.decorate_questions(rows, viewer).await?;
        Ok(Page { items, info })
    }

    async fn decorate_questions(
        &self,
        rows: Vec<question::Model>,
        viewer: Option<Actor>,
    ) -> Result<Vec<QuestionWithDetails>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|q| q.id).collect();
        let author_ids: Vec<Uuid> = rows.iter().map(|q| q.author_id).collect();

        let authors = self.users.authors(&author_ids).await?;
        let mut tags = self.tags.names_for_questions(&ids).await?;
        let viewer_votes = match viewer {
            Some(actor) => self.votes.kinds_for_questions(actor.user_id, &ids).await?,
            None => HashMap::new(),
        };

        rows.into_iter()
            .map(|q| {
                Ok(QuestionWithDetails {
                    author: author_of(&authors, q.author_id)?,
                    tags: tags.remove(&q.id).unwrap_or_default(),
                    viewer_vote: viewer_votes.get(&q.id).copied(),
                    id: q.id,
                    title: q.title,
                    content: q.content,
                    rating: q.rating,
                    answers_count: q.answers_count,
                    created_at: q.created_at,
                })
            })
            .collect()
    }

    async fn decorate_answers(
        &self,
        rows: Vec<answer::Model>,
        viewer: Option<Actor>,
    ) -> Result<Vec<AnswerWithDetails>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|a| a.id).collect();
        let author_ids: Vec<Uuid> = rows.iter().map(|a| a.author_id).collect();

        let authors = self.users.authors(&author_ids).await?;
        let viewer_votes = match viewer {
            Some(actor) => self.votes.kinds_for_answers(actor.user_id, &ids).await?,
            None => HashMap::new(),
        };

        rows.into_iter()
            .map(|a| {
                Ok(AnswerWithDetails {
                    author: author_of(&authors, a.author_id)?,
                    viewer_vote: viewer_votes.get(&a.id).copied(),
                    id: a.id,
                    question_id: a.question_id,
                    content: a.content,
                    is_correct: a.is_correct,
                    rating: a.rating,
                    created_at: a.created_at,
                })
            })
            .collect()
    }
}

fn author_of(authors: &HashMap<Uuid, Author>, user_id: Uuid) -> Result<Author, AppError> {
    authors
        .get(&user_id)
        .cloned()
        .ok_or_else(|| AppError::Internal(format!("Author {} missing", user_id)))
}

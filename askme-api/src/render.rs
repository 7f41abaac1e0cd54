//! Server-side HTML for every page. Plain `format!` templates; anything that
//! came from a user goes through [`escape`].

use askme_app::application::forms::{
    AnswerForm, AskForm, LoginForm, ProfileEditForm, SignupForm,
};
use askme_app::application::{CurrentUser, QuestionPage, Sidebar};
use askme_app::domain::{
    AnswerWithDetails, Author, Page, PageInfo, ProfileDetails, QuestionWithDetails, VoteKind,
};
use askme_errors::FieldErrors;
use axum::http::StatusCode;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Header and side panels shared by all pages.
pub struct Chrome<'a> {
    pub user: Option<&'a CurrentUser>,
    pub sidebar: &'a Sidebar,
}

pub fn layout(title: &str, chrome: &Chrome<'_>, content: &str) -> String {
    let title = escape(title);
    let account = match chrome.user {
        Some(current) => format!(
            r#"<a class="header__profile" href="/profile/{profile_id}/">{nickname}</a>
            <a href="/profile/edit/">settings</a>
            <a href="/logout/">log out</a>"#,
            profile_id = current.profile.id,
            nickname = escape(&current.profile.nickname),
        ),
        None => r#"<a href="/login/">log in</a> <a href="/signup/">register</a>"#.to_string(),
    };
    let sidebar = sidebar(chrome.sidebar);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - AskMe</title>
    <style>{CSS}</style>
</head>
<body>
    <header class="header">
        <a class="header__logo" href="/">AskMe</a>
        <a class="header__ask" href="/ask/">Ask!</a>
        <nav class="header__account">{account}</nav>
    </header>
    <div class="container">
        <main class="content">{content}</main>
        <aside class="sidebar">{sidebar}</aside>
    </div>
    <script src="/static/js/app.js"></script>
</body>
</html>"#
    )
}

fn sidebar(sidebar: &Sidebar) -> String {
    let tags: String = sidebar
        .top_tags
        .iter()
        .map(|t| {
            format!(
                r#"<li><a class="tag" href="/tag/{href}/">{name}</a> <span class="muted">{count}</span></li>"#,
                href = urlencoding::encode(&t.name),
                name = escape(&t.name),
                count = t.questions_count,
            )
        })
        .collect();
    let members: String = sidebar
        .top_contributors
        .iter()
        .map(|c| {
            format!(
                r#"<li>{author} <span class="muted">{rating}</span></li>"#,
                author = author_link(&c.author),
                rating = c.rating,
            )
        })
        .collect();

    format!(
        r#"<section class="panel"><h3>Popular Tags</h3><ul>{tags}</ul></section>
        <section class="panel"><h3>Best Members</h3><ul>{members}</ul></section>"#
    )
}

fn author_link(author: &Author) -> String {
    let name = escape(author.display_name());
    match author.profile_id {
        Some(id) => format!(r#"<a href="/profile/{id}/">{name}</a>"#),
        None => name,
    }
}

fn avatar(author: &Author) -> String {
    match &author.avatar {
        Some(src) => format!(r#"<img class="avatar" src="{}" alt="">"#, escape(src)),
        None => {
            let initial: String = author.display_name().chars().take(1).collect();
            format!(r#"<span class="avatar">{}</span>"#, escape(&initial.to_uppercase()))
        }
    }
}

fn vote_buttons(vote: Option<VoteKind>, enabled: bool) -> String {
    if !enabled {
        return String::new();
    }
    let active = |kind: VoteKind| if vote == Some(kind) { " active" } else { "" };
    format!(
        r#"<button class="like-button{like}" type="button">+</button><button class="dislike-button{dislike}" type="button">&minus;</button>"#,
        like = active(VoteKind::Like),
        dislike = active(VoteKind::Dislike),
    )
}

fn tag_links(tags: &[String]) -> String {
    tags.iter()
        .map(|t| {
            format!(
                r#"<a class="tag" href="/tag/{}/">{}</a>"#,
                urlencoding::encode(t),
                escape(t)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn question_card(q: &QuestionWithDetails, can_vote: bool) -> String {
    format!(
        r#"<article class="question" data-question-id="{id}">
    <div class="question__side">{avatar}
        <div class="votes">{buttons}<span class="rating">{rating}</span></div>
    </div>
    <div class="question__body">
        <h2><a href="/question/{id}/">{title}</a></h2>
        <p>{content}</p>
        <p class="meta">{author} &middot; <a href="/question/{id}/">answers ({answers})</a> &middot; {tags}</p>
    </div>
</article>"#,
        id = q.id,
        avatar = avatar(&q.author),
        buttons = vote_buttons(q.viewer_vote, can_vote),
        rating = q.rating,
        title = escape(&q.title),
        content = escape(&q.content),
        author = author_link(&q.author),
        answers = q.answers_count,
        tags = tag_links(&q.tags),
    )
}

fn answer_card(a: &AnswerWithDetails, viewer: Option<&CurrentUser>, question_author: bool) -> String {
    let viewer_id = viewer.map(|v| v.user.id);
    let checkbox = if question_author {
        format!(
            r#"<label><input class="correct-checkbox" type="checkbox"{checked}> Correct</label>"#,
            checked = if a.is_correct { " checked" } else { "" },
        )
    } else if a.is_correct {
        r#"<span class="correct">Correct</span>"#.to_string()
    } else {
        String::new()
    };
    let delete = if viewer_id == Some(a.author.user_id) {
        r#"<button class="delete-button" type="button">delete</button>"#
    } else {
        ""
    };

    format!(
        r#"<article class="answer" id="answer_{id}" data-answer-id="{id}" data-question-id="{question_id}">
    <div class="question__side">{avatar}
        <div class="votes">{buttons}<span class="rating">{rating}</span></div>
    </div>
    <div class="question__body">
        <p>{content}</p>
        <p class="meta">{author} &middot; {created} {checkbox} {delete}</p>
    </div>
</article>"#,
        id = a.id,
        question_id = a.question_id,
        avatar = avatar(&a.author),
        buttons = vote_buttons(a.viewer_vote, viewer.is_some()),
        rating = a.rating,
        content = escape(&a.content),
        author = author_link(&a.author),
        created = a.created_at.format("%Y-%m-%d %H:%M"),
    )
}

fn pagination(info: &PageInfo, base_path: &str) -> String {
    if info.num_pages <= 1 {
        return String::new();
    }
    let link = |n: u64, label: &str| format!(r#"<a href="{base_path}?page={n}">{label}</a>"#);

    let mut out = String::from(r#"<nav class="pagination">"#);
    if let Some(prev) = info.previous_page_number {
        out.push_str(&link(1, "&laquo;"));
        out.push_str(&link(prev, "&lsaquo;"));
    }
    out.push_str(&format!(
        r#"<span class="current">{} / {}</span>"#,
        info.number, info.num_pages
    ));
    if let Some(next) = info.next_page_number {
        out.push_str(&link(next, "&rsaquo;"));
        out.push_str(&link(info.num_pages, "&raquo;"));
    }
    out.push_str("</nav>");
    out
}

pub fn question_list(
    heading: &str,
    tabs: &str,
    page: &Page<QuestionWithDetails>,
    base_path: &str,
    can_vote: bool,
) -> String {
    let cards: String = if page.is_empty() {
        r#"<p class="muted">No questions yet.</p>"#.to_string()
    } else {
        page.items.iter().map(|q| question_card(q, can_vote)).collect()
    };
    format!(
        r#"<h1>{heading} {tabs}</h1>{cards}{pagination}"#,
        heading = escape(heading),
        pagination = pagination(&page.info, base_path),
    )
}

pub fn question_detail(
    detail: &QuestionPage,
    viewer: Option<&CurrentUser>,
    form: &AnswerForm,
    errors: &FieldErrors,
) -> String {
    let question = &detail.question;
    let question_author = viewer.map(|v| v.user.id) == Some(question.author.user_id);
    let answers: String = detail
        .answers
        .items
        .iter()
        .map(|a| answer_card(a, viewer, question_author))
        .collect();
    let base_path = format!("/question/{}/", question.id);

    let answer_form = if viewer.is_some() {
        format!(
            r#"<form class="form" method="post" action="{base_path}">
    {non_field}
    {text}
    <button type="submit">Answer</button>
</form>"#,
            non_field = non_field_errors(errors),
            text = textarea("text", "Your answer", &form.text, errors),
        )
    } else {
        format!(
            r#"<p><a href="/login/?next={}">Log in</a> to answer.</p>"#,
            urlencoding::encode(&base_path)
        )
    };

    format!(
        r#"{card}<h2>Answers</h2>{answers}{pagination}{answer_form}"#,
        card = question_card(question, viewer.is_some()),
        pagination = pagination(&detail.answers.info, &base_path),
    )
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|msg| format!(r#"<span class="field-error">{}</span>"#, escape(msg)))
        .unwrap_or_default()
}

fn non_field_errors(errors: &FieldErrors) -> String {
    errors
        .non_field_errors()
        .map(|msg| format!(r#"<p class="form-error">{}</p>"#, escape(msg)))
        .collect()
}

fn input(name: &str, label: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<label>{label}<input type="{kind}" name="{name}" value="{value}">{error}</label>"#,
        value = escape(value),
        error = field_error(errors, name),
    )
}

fn textarea(name: &str, label: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<label>{label}<textarea name="{name}" rows="6">{value}</textarea>{error}</label>"#,
        value = escape(value),
        error = field_error(errors, name),
    )
}

pub fn ask_form(form: &AskForm, errors: &FieldErrors) -> String {
    format!(
        r#"<h1>New Question</h1>
<form class="form" method="post" action="/ask/">
    {non_field}
    {title}
    {text}
    {tags}
    <button type="submit">Ask!</button>
</form>"#,
        non_field = non_field_errors(errors),
        title = input("title", "Title", "text", &form.title, errors),
        text = textarea("text", "Text", &form.text, errors),
        tags = input("tags", "Tags (space separated)", "text", &form.tags, errors),
    )
}

pub fn login_form(form: &LoginForm, errors: &FieldErrors) -> String {
    let next = form.next.as_deref().unwrap_or_default();
    format!(
        r#"<h1>Log In</h1>
<form class="form" method="post" action="/login/">
    {non_field}
    {username}
    {password}
    <input type="hidden" name="next" value="{next}">
    <button type="submit">Log in</button>
</form>"#,
        non_field = non_field_errors(errors),
        username = input("username", "Login", "text", &form.username, errors),
        password = input("password", "Password", "password", "", errors),
        next = escape(next),
    )
}

pub fn signup_form(form: &SignupForm, errors: &FieldErrors) -> String {
    format!(
        r#"<h1>Registration</h1>
<form class="form" method="post" action="/signup/">
    {non_field}
    {username}
    {email}
    {nickname}
    {password}
    {repeat}
    {avatar}
    <button type="submit">Register</button>
</form>"#,
        non_field = non_field_errors(errors),
        username = input("username", "Login", "text", &form.username, errors),
        email = input("email", "Email", "email", &form.email, errors),
        nickname = input("nickname", "Nickname", "text", &form.nickname, errors),
        password = input("password", "Password", "password", "", errors),
        repeat = input("repeat_password", "Repeat password", "password", "", errors),
        avatar = input(
            "avatar",
            "Avatar URL",
            "text",
            form.avatar.as_deref().unwrap_or_default(),
            errors
        ),
    )
}

pub fn profile_edit_form(form: &ProfileEditForm, errors: &FieldErrors, saved: bool) -> String {
    let notice = if saved {
        r#"<p class="notice">Profile saved.</p>"#
    } else {
        ""
    };
    format!(
        r#"<h1>Settings</h1>{notice}
<form class="form" method="post" action="/profile/edit/">
    {non_field}
    {email}
    {nickname}
    {avatar}
    <button type="submit">Save</button>
</form>"#,
        non_field = non_field_errors(errors),
        email = input("email", "Email", "email", &form.email, errors),
        nickname = input("nickname", "Nickname", "text", &form.nickname, errors),
        avatar = input(
            "avatar",
            "Avatar URL",
            "text",
            form.avatar.as_deref().unwrap_or_default(),
            errors
        ),
    )
}

pub fn profile(details: &ProfileDetails) -> String {
    let author = Author {
        user_id: details.user_id,
        profile_id: Some(details.profile_id),
        username: details.username.clone(),
        nickname: details.nickname.clone(),
        avatar: details.avatar.clone(),
    };
    format!(
        r#"<h1>{nickname}</h1>
<div class="profile">{avatar}
    <p>@{username}</p>
    <p>Questions: {questions} &middot; Answers: {answers}</p>
    <p class="muted">Member since {joined}</p>
</div>"#,
        nickname = escape(&details.nickname),
        avatar = avatar(&author),
        username = escape(&details.username),
        questions = details.questions_count,
        answers = details.answers_count,
        joined = details.joined_at.format("%Y-%m-%d"),
    )
}

pub fn not_found(message: &str) -> String {
    format!(
        r#"<div class="error"><p class="error__title">404</p><p class="error__message">{}</p><a href="/">Back to questions</a></div>"#,
        escape(message)
    )
}

/// Standalone page for failures that happen before the side panels could be
/// loaded.
pub fn error_page(status: StatusCode, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Error {code} - AskMe</title>
    <style>{CSS}</style>
</head>
<body>
    <main class="container">
        <div class="error">
            <p class="error__title">Error {code}</p>
            <p class="error__message">{message}</p>
            <a href="/">Back to questions</a>
        </div>
    </main>
</body>
</html>"#,
        code = status.as_u16(),
        message = escape(message),
    )
}

const CSS: &str = r#"
:root {
    --base: #faf4ed;
    --surface: #fffaf3;
    --overlay: #f2e9e1;
    --muted: #9893a5;
    --text: #575279;
    --love: #b4637a;
    --pine: #286983;
    --foam: #56949f;
}
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: 'Inter', -apple-system, sans-serif; background: var(--base); color: var(--text); }
a { color: var(--pine); }
.header { display: flex; gap: 1.5rem; align-items: center; padding: 1rem 2rem; background: var(--surface); border-bottom: 2px solid var(--overlay); }
.header__logo { font-weight: 800; font-size: 1.4rem; color: var(--love); text-decoration: none; }
.header__account { margin-left: auto; display: flex; gap: 1rem; }
.container { max-width: 1100px; margin: 0 auto; padding: 1.5rem; display: flex; gap: 2rem; }
.content { flex: 3; }
.sidebar { flex: 1; }
.panel { background: var(--surface); border: 2px solid var(--overlay); border-radius: 8px; padding: 1rem; margin-bottom: 1rem; }
.panel ul { list-style: none; }
.question, .answer { display: flex; gap: 1rem; background: var(--surface); border: 2px solid var(--overlay); border-radius: 12px; padding: 1rem; margin: 1rem 0; }
.question__side { display: flex; flex-direction: column; align-items: center; gap: 0.5rem; }
.avatar { width: 48px; height: 48px; border-radius: 50%; background: var(--overlay); display: flex; align-items: center; justify-content: center; object-fit: cover; }
.votes button { border: 1px solid var(--overlay); background: var(--base); border-radius: 4px; width: 1.6rem; cursor: pointer; }
.votes button.active { background: var(--foam); color: var(--base); }
.rating { display: block; text-align: center; font-weight: 700; }
.meta { color: var(--muted); font-size: 0.9rem; margin-top: 0.5rem; }
.tag { background: var(--overlay); border-radius: 4px; padding: 0 0.4rem; text-decoration: none; }
.correct { color: var(--pine); font-weight: 700; }
.pagination { display: flex; gap: 0.75rem; margin: 1rem 0; }
.form { display: flex; flex-direction: column; gap: 0.75rem; margin: 1rem 0; }
.form label { display: flex; flex-direction: column; gap: 0.25rem; }
.form input, .form textarea { padding: 0.5rem; border: 2px solid var(--overlay); border-radius: 6px; background: var(--surface); color: var(--text); }
.form button { align-self: flex-start; padding: 0.6rem 1.4rem; background: var(--love); color: var(--base); border: none; border-radius: 8px; cursor: pointer; }
.field-error, .form-error { color: var(--love); font-size: 0.9rem; }
.notice { color: var(--pine); }
.muted { color: var(--muted); }
.error { background: #fce8ec; border: 2px solid var(--love); border-radius: 8px; padding: 1.25rem; margin: 2rem 0; }
.error__title { color: var(--love); font-weight: 700; margin-bottom: 0.5rem; }
.error__message { color: #8b3d4d; margin-bottom: 0.5rem; }
"#;

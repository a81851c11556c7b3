use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};
use ts_rs::TS;
use utoipa::ToSchema;

use super::{
    ContentEntity, ContentState, ContentStores, default_active, push_coalesce, require_text,
};
use crate::error::AppError;

// --- Pastor (about page) ---

/// Pastor
///
/// A member of the pastoral staff shown on the about page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pastor {
    pub id: i64,
    pub name: String,
    /// Position, e.g. "담임목사".
    pub title: String,
    pub bio: String,
    pub image_url: Option<String>,
    pub email: Option<String>,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PastorInput {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub bio: String,
    pub image_url: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PastorPatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub email: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

impl ContentEntity for Pastor {
    type Create = PastorInput;
    type Update = PastorPatch;

    const TABLE: &'static str = "pastors";
    const COLUMNS: &'static str =
        "id, name, title, bio, image_url, email, sort_order, is_active, created_at, updated_at";
    const SLUG: &'static str = "pastors";
    const LABEL: &'static str = "교역자";

    fn id(&self) -> i64 {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn validate(req: &PastorInput) -> Result<(), AppError> {
        require_text(&req.name, "이름")?;
        require_text(&req.title, "직분")
    }

    fn check(&self) -> Result<(), AppError> {
        require_text(&self.name, "이름")?;
        require_text(&self.title, "직분")
    }

    fn build(id: i64, req: PastorInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: req.name,
            title: req.title,
            bio: req.bio,
            image_url: req.image_url,
            email: req.email,
            order: req.order,
            is_active: req.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, req: PastorPatch, now: DateTime<Utc>) {
        if let Some(name) = req.name {
            self.name = name;
        }
        if let Some(title) = req.title {
            self.title = title;
        }
        if let Some(bio) = req.bio {
            self.bio = bio;
        }
        if req.image_url.is_some() {
            self.image_url = req.image_url;
        }
        if req.email.is_some() {
            self.email = req.email;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        if let Some(is_active) = req.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    fn set_order(&mut self, order: i32, now: DateTime<Utc>) {
        self.order = order;
        self.updated_at = now;
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, req: PastorInput) {
        builder.push("(name, title, bio, image_url, email, sort_order, is_active) VALUES (");
        let mut values = builder.separated(", ");
        values.push_bind(req.name);
        values.push_bind(req.title);
        values.push_bind(req.bio);
        values.push_bind(req.image_url);
        values.push_bind(req.email);
        values.push_bind(req.order);
        values.push_bind(req.is_active);
        values.push_unseparated(")");
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, req: PastorPatch) {
        push_coalesce(builder, "name", req.name);
        push_coalesce(builder, "title", req.title);
        push_coalesce(builder, "bio", req.bio);
        push_coalesce(builder, "image_url", req.image_url);
        push_coalesce(builder, "email", req.email);
        push_coalesce(builder, "sort_order", req.order);
        push_coalesce(builder, "is_active", req.is_active);
    }

    fn store(stores: &ContentStores) -> &ContentState<Self> {
        &stores.pastors
    }
}

// --- Event ---

/// Event
///
/// A church event or special service listed on the events page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[ts(type = "string")]
    pub event_date: NaiveDate,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[ts(type = "string")]
    pub event_date: NaiveDate,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[ts(type = "string | null")]
    pub event_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

fn check_event_dates(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), AppError> {
    match end {
        Some(end) if end < start => Err(AppError::invalid(
            "종료일은 시작일보다 빠를 수 없습니다.",
        )),
        _ => Ok(()),
    }
}

impl ContentEntity for Event {
    type Create = EventInput;
    type Update = EventPatch;

    const TABLE: &'static str = "events";
    const COLUMNS: &'static str = "id, title, description, event_date, end_date, location, image_url, sort_order, is_active, created_at, updated_at";
    const SLUG: &'static str = "events";
    const LABEL: &'static str = "행사";

    fn id(&self) -> i64 {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn validate(req: &EventInput) -> Result<(), AppError> {
        require_text(&req.title, "제목")?;
        check_event_dates(req.event_date, req.end_date)
    }

    fn check(&self) -> Result<(), AppError> {
        require_text(&self.title, "제목")?;
        check_event_dates(self.event_date, self.end_date)
    }

    fn build(id: i64, req: EventInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: req.title,
            description: req.description,
            event_date: req.event_date,
            end_date: req.end_date,
            location: req.location,
            image_url: req.image_url,
            order: req.order,
            is_active: req.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, req: EventPatch, now: DateTime<Utc>) {
        if let Some(title) = req.title {
            self.title = title;
        }
        if let Some(description) = req.description {
            self.description = description;
        }
        if let Some(event_date) = req.event_date {
            self.event_date = event_date;
        }
        if req.end_date.is_some() {
            self.end_date = req.end_date;
        }
        if req.location.is_some() {
            self.location = req.location;
        }
        if req.image_url.is_some() {
            self.image_url = req.image_url;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        if let Some(is_active) = req.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    fn set_order(&mut self, order: i32, now: DateTime<Utc>) {
        self.order = order;
        self.updated_at = now;
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, req: EventInput) {
        builder.push(
            "(title, description, event_date, end_date, location, image_url, sort_order, is_active) VALUES (",
        );
        let mut values = builder.separated(", ");
        values.push_bind(req.title);
        values.push_bind(req.description);
        values.push_bind(req.event_date);
        values.push_bind(req.end_date);
        values.push_bind(req.location);
        values.push_bind(req.image_url);
        values.push_bind(req.order);
        values.push_bind(req.is_active);
        values.push_unseparated(")");
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, req: EventPatch) {
        push_coalesce(builder, "title", req.title);
        push_coalesce(builder, "description", req.description);
        push_coalesce(builder, "event_date", req.event_date);
        push_coalesce(builder, "end_date", req.end_date);
        push_coalesce(builder, "location", req.location);
        push_coalesce(builder, "image_url", req.image_url);
        push_coalesce(builder, "sort_order", req.order);
        push_coalesce(builder, "is_active", req.is_active);
    }

    fn store(stores: &ContentStores) -> &ContentState<Self> {
        &stores.events
    }
}

// --- Ministry team ---

/// MinistryTeam
///
/// A serving team (worship, media, hospitality, ...) on the ministry page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MinistryTeam {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub leader: Option<String>,
    pub meeting_time: Option<String>,
    pub image_url: Option<String>,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MinistryTeamInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub leader: Option<String>,
    pub meeting_time: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MinistryTeamPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub leader: Option<String>,
    pub meeting_time: Option<String>,
    pub image_url: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

impl ContentEntity for MinistryTeam {
    type Create = MinistryTeamInput;
    type Update = MinistryTeamPatch;

    const TABLE: &'static str = "ministry_teams";
    const COLUMNS: &'static str = "id, name, description, leader, meeting_time, image_url, sort_order, is_active, created_at, updated_at";
    const SLUG: &'static str = "ministries";
    const LABEL: &'static str = "사역팀";

    fn id(&self) -> i64 {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn validate(req: &MinistryTeamInput) -> Result<(), AppError> {
        require_text(&req.name, "사역팀 이름")
    }

    fn check(&self) -> Result<(), AppError> {
        require_text(&self.name, "사역팀 이름")
    }

    fn build(id: i64, req: MinistryTeamInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: req.name,
            description: req.description,
            leader: req.leader,
            meeting_time: req.meeting_time,
            image_url: req.image_url,
            order: req.order,
            is_active: req.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, req: MinistryTeamPatch, now: DateTime<Utc>) {
        if let Some(name) = req.name {
            self.name = name;
        }
        if let Some(description) = req.description {
            self.description = description;
        }
        if req.leader.is_some() {
            self.leader = req.leader;
        }
        if req.meeting_time.is_some() {
            self.meeting_time = req.meeting_time;
        }
        if req.image_url.is_some() {
            self.image_url = req.image_url;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        if let Some(is_active) = req.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    fn set_order(&mut self, order: i32, now: DateTime<Utc>) {
        self.order = order;
        self.updated_at = now;
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, req: MinistryTeamInput) {
        builder.push(
            "(name, description, leader, meeting_time, image_url, sort_order, is_active) VALUES (",
        );
        let mut values = builder.separated(", ");
        values.push_bind(req.name);
        values.push_bind(req.description);
        values.push_bind(req.leader);
        values.push_bind(req.meeting_time);
        values.push_bind(req.image_url);
        values.push_bind(req.order);
        values.push_bind(req.is_active);
        values.push_unseparated(")");
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, req: MinistryTeamPatch) {
        push_coalesce(builder, "name", req.name);
        push_coalesce(builder, "description", req.description);
        push_coalesce(builder, "leader", req.leader);
        push_coalesce(builder, "meeting_time", req.meeting_time);
        push_coalesce(builder, "image_url", req.image_url);
        push_coalesce(builder, "sort_order", req.order);
        push_coalesce(builder, "is_active", req.is_active);
    }

    fn store(stores: &ContentStores) -> &ContentState<Self> {
        &stores.ministries
    }
}

// --- Community ---

/// Community
///
/// A fellowship group (youth, young adults, cell groups) on the community page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Community {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Who the group is for, e.g. "20-30대 청년".
    pub target: Option<String>,
    pub meeting_time: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CommunityInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target: Option<String>,
    pub meeting_time: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CommunityPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target: Option<String>,
    pub meeting_time: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

impl ContentEntity for Community {
    type Create = CommunityInput;
    type Update = CommunityPatch;

    const TABLE: &'static str = "communities";
    const COLUMNS: &'static str = "id, name, description, target, meeting_time, location, image_url, sort_order, is_active, created_at, updated_at";
    const SLUG: &'static str = "communities";
    const LABEL: &'static str = "공동체";

    fn id(&self) -> i64 {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn validate(req: &CommunityInput) -> Result<(), AppError> {
        require_text(&req.name, "공동체 이름")
    }

    fn check(&self) -> Result<(), AppError> {
        require_text(&self.name, "공동체 이름")
    }

    fn build(id: i64, req: CommunityInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: req.name,
            description: req.description,
            target: req.target,
            meeting_time: req.meeting_time,
            location: req.location,
            image_url: req.image_url,
            order: req.order,
            is_active: req.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, req: CommunityPatch, now: DateTime<Utc>) {
        if let Some(name) = req.name {
            self.name = name;
        }
        if let Some(description) = req.description {
            self.description = description;
        }
        if req.target.is_some() {
            self.target = req.target;
        }
        if req.meeting_time.is_some() {
            self.meeting_time = req.meeting_time;
        }
        if req.location.is_some() {
            self.location = req.location;
        }
        if req.image_url.is_some() {
            self.image_url = req.image_url;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        if let Some(is_active) = req.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    fn set_order(&mut self, order: i32, now: DateTime<Utc>) {
        self.order = order;
        self.updated_at = now;
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, req: CommunityInput) {
        builder.push(
            "(name, description, target, meeting_time, location, image_url, sort_order, is_active) VALUES (",
        );
        let mut values = builder.separated(", ");
        values.push_bind(req.name);
        values.push_bind(req.description);
        values.push_bind(req.target);
        values.push_bind(req.meeting_time);
        values.push_bind(req.location);
        values.push_bind(req.image_url);
        values.push_bind(req.order);
        values.push_bind(req.is_active);
        values.push_unseparated(")");
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, req: CommunityPatch) {
        push_coalesce(builder, "name", req.name);
        push_coalesce(builder, "description", req.description);
        push_coalesce(builder, "target", req.target);
        push_coalesce(builder, "meeting_time", req.meeting_time);
        push_coalesce(builder, "location", req.location);
        push_coalesce(builder, "image_url", req.image_url);
        push_coalesce(builder, "sort_order", req.order);
        push_coalesce(builder, "is_active", req.is_active);
    }

    fn store(stores: &ContentStores) -> &ContentState<Self> {
        &stores.communities
    }
}

// --- Family program ---

/// FamilyProgram
///
/// A family-ministry program with its own page (nursery, children, parenting classes).
/// `slug` is unique and used by the front-end for the page URL.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FamilyProgram {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub target_age: Option<String>,
    pub schedule: Option<String>,
    pub image_url: Option<String>,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FamilyProgramInput {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,
    pub target_age: Option<String>,
    pub schedule: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FamilyProgramPatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub target_age: Option<String>,
    pub schedule: Option<String>,
    pub image_url: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

fn check_slug(slug: &str) -> Result<(), AppError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AppError::invalid(
            "슬러그는 영문 소문자, 숫자, 하이픈(-)만 사용할 수 있습니다.",
        ))
    }
}

impl ContentEntity for FamilyProgram {
    type Create = FamilyProgramInput;
    type Update = FamilyProgramPatch;

    const TABLE: &'static str = "family_programs";
    const COLUMNS: &'static str = "id, slug, title, summary, body, target_age, schedule, image_url, sort_order, is_active, created_at, updated_at";
    const SLUG: &'static str = "family-programs";
    const LABEL: &'static str = "가정 사역 프로그램";

    fn id(&self) -> i64 {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn validate(req: &FamilyProgramInput) -> Result<(), AppError> {
        check_slug(&req.slug)?;
        require_text(&req.title, "제목")
    }

    fn check(&self) -> Result<(), AppError> {
        check_slug(&self.slug)?;
        require_text(&self.title, "제목")
    }

    fn build(id: i64, req: FamilyProgramInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            slug: req.slug,
            title: req.title,
            summary: req.summary,
            body: req.body,
            target_age: req.target_age,
            schedule: req.schedule,
            image_url: req.image_url,
            order: req.order,
            is_active: req.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, req: FamilyProgramPatch, now: DateTime<Utc>) {
        if let Some(slug) = req.slug {
            self.slug = slug;
        }
        if let Some(title) = req.title {
            self.title = title;
        }
        if let Some(summary) = req.summary {
            self.summary = summary;
        }
        if let Some(body) = req.body {
            self.body = body;
        }
        if req.target_age.is_some() {
            self.target_age = req.target_age;
        }
        if req.schedule.is_some() {
            self.schedule = req.schedule;
        }
        if req.image_url.is_some() {
            self.image_url = req.image_url;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        if let Some(is_active) = req.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    fn set_order(&mut self, order: i32, now: DateTime<Utc>) {
        self.order = order;
        self.updated_at = now;
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, req: FamilyProgramInput) {
        builder.push(
            "(slug, title, summary, body, target_age, schedule, image_url, sort_order, is_active) VALUES (",
        );
        let mut values = builder.separated(", ");
        values.push_bind(req.slug);
        values.push_bind(req.title);
        values.push_bind(req.summary);
        values.push_bind(req.body);
        values.push_bind(req.target_age);
        values.push_bind(req.schedule);
        values.push_bind(req.image_url);
        values.push_bind(req.order);
        values.push_bind(req.is_active);
        values.push_unseparated(")");
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, req: FamilyProgramPatch) {
        push_coalesce(builder, "slug", req.slug);
        push_coalesce(builder, "title", req.title);
        push_coalesce(builder, "summary", req.summary);
        push_coalesce(builder, "body", req.body);
        push_coalesce(builder, "target_age", req.target_age);
        push_coalesce(builder, "schedule", req.schedule);
        push_coalesce(builder, "image_url", req.image_url);
        push_coalesce(builder, "sort_order", req.order);
        push_coalesce(builder, "is_active", req.is_active);
    }

    fn store(stores: &ContentStores) -> &ContentState<Self> {
        &stores.family_programs
    }
}

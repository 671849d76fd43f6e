//! Database repository for CRUD operations.
//!
//! Every operation acquires the cached pool from `Database` and touches a
//! single record. Partial updates merge supplied fields over the stored row.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::Database;
use crate::errors::AppError;
use crate::models::{
    text_or_default, BlogPost, Comment, CreateBlogPostRequest, CreateCommentRequest,
    CreateListingRequest, CreateSupportTicketRequest, EventProposal, ItemCondition, Listing,
    ListingChanges, ListingDefaults, ListingStatus, PodcastSubscriber, SubscribeOutcome,
    SupportTicket, TicketStatus, UpdateBlogPostRequest, UpdateListingRequest,
    UpdateSupportTicketRequest, ANONYMOUS_AUTHOR, DEFAULT_BLOG_CATEGORY,
    DEFAULT_LISTING_CATEGORY,
};

const BLOG_COLUMNS: &str =
    "id, title, content, category, image, author, likes, comments, created_at, updated_at";
const SUBSCRIBER_COLUMNS: &str =
    "id, email, is_active, date_subscribed, date_unsubscribed, created_at, updated_at";
const LISTING_COLUMNS: &str = "id, name, description, image, category, price, hide_price, condition, seller_name, contact_email, contact_phone, status, created_at, updated_at";

const DUPLICATE_EMAIL: &str = "Email is already subscribed";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    db: Arc<Database>,
}

impl Repository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn pool(&self) -> Result<&SqlitePool, AppError> {
        self.db.connect().await
    }

    // ==================== BLOG OPERATIONS ====================

    /// List blog posts, newest first.
    pub async fn list_blog_posts(&self, category: Option<&str>) -> Result<Vec<BlogPost>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM blog_posts WHERE (? IS NULL OR category = ?) ORDER BY created_at DESC, rowid DESC",
            BLOG_COLUMNS
        ))
        .bind(category)
        .bind(category)
        .fetch_all(self.pool().await?)
        .await?;

        Ok(rows.iter().map(blog_post_from_row).collect())
    }

    /// Get a blog post by ID.
    pub async fn get_blog_post(&self, id: &str) -> Result<Option<BlogPost>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM blog_posts WHERE id = ?", BLOG_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool().await?)
            .await?;

        Ok(row.as_ref().map(blog_post_from_row))
    }

    /// Create a new blog post. `image` is the already-hosted URL, if any.
    pub async fn create_blog_post(
        &self,
        request: &CreateBlogPostRequest,
        image: Option<String>,
    ) -> Result<BlogPost, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();
        let category = text_or_default(request.category.as_ref(), DEFAULT_BLOG_CATEGORY);
        let author = text_or_default(request.author.as_ref(), ANONYMOUS_AUTHOR);

        sqlx::query(
            "INSERT INTO blog_posts (id, title, content, category, image, author, likes, comments, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 0, '[]', ?, ?)"
        )
        .bind(&id)
        .bind(request.title.trim())
        .bind(&request.content)
        .bind(&category)
        .bind(&image)
        .bind(&author)
        .bind(&now)
        .bind(&now)
        .execute(self.pool().await?)
        .await?;

        Ok(BlogPost {
            id,
            title: request.title.trim().to_string(),
            content: request.content.clone(),
            category,
            image,
            author,
            likes: 0,
            comments: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Apply a partial update to a blog post.
    pub async fn update_blog_post(
        &self,
        id: &str,
        request: &UpdateBlogPostRequest,
    ) -> Result<BlogPost, AppError> {
        let existing = self
            .get_blog_post(id)
            .await?
            .ok_or_else(|| blog_not_found(id))?;

        let now = timestamp();
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.title)
            .to_string();
        let content = request.content.clone().unwrap_or(existing.content.clone());
        let category = patched_or_default(
            request.category.as_ref(),
            &existing.category,
            DEFAULT_BLOG_CATEGORY,
        );
        let image = request.image.clone().or(existing.image.clone());
        let author = patched_or_default(request.author.as_ref(), &existing.author, ANONYMOUS_AUTHOR);

        let result = sqlx::query(
            "UPDATE blog_posts SET title = ?, content = ?, category = ?, image = ?, author = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&title)
        .bind(&content)
        .bind(&category)
        .bind(&image)
        .bind(&author)
        .bind(&now)
        .bind(id)
        .execute(self.pool().await?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(blog_not_found(id));
        }

        Ok(BlogPost {
            title,
            content,
            category,
            image,
            author,
            updated_at: now,
            ..existing
        })
    }

    /// Delete a blog post along with its comments.
    pub async fn delete_blog_post(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(self.pool().await?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(blog_not_found(id));
        }
        Ok(())
    }

    /// Comments on a post, oldest first.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let row = sqlx::query("SELECT comments FROM blog_posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(self.pool().await?)
            .await?
            .ok_or_else(|| blog_not_found(post_id))?;

        let comments: String = row.get("comments");
        Ok(parse_comments(&comments))
    }

    /// Append a comment to a post in a single statement.
    pub async fn add_comment(
        &self,
        post_id: &str,
        request: &CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        let now = timestamp();
        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            content: request.content.trim().to_string(),
            author: text_or_default(request.author.as_ref(), ANONYMOUS_AUTHOR),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        let comment_json = serde_json::to_string(&comment)?;

        let result = sqlx::query(
            "UPDATE blog_posts SET comments = json_insert(comments, '$[#]', json(?)), updated_at = ? WHERE id = ?"
        )
        .bind(&comment_json)
        .bind(&now)
        .bind(post_id)
        .execute(self.pool().await?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(blog_not_found(post_id));
        }
        Ok(comment)
    }

    /// Remove one like, never going below zero.
    pub async fn unlike_blog_post(&self, id: &str) -> Result<BlogPost, AppError> {
        let result = sqlx::query(
            "UPDATE blog_posts SET likes = MAX(likes - 1, 0), updated_at = ? WHERE id = ?",
        )
        .bind(timestamp())
        .bind(id)
        .execute(self.pool().await?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(blog_not_found(id));
        }

        self.get_blog_post(id)
            .await?
            .ok_or_else(|| blog_not_found(id))
    }

    // ==================== EVENT PROPOSAL OPERATIONS ====================

    /// List event proposals, newest first.
    pub async fn list_event_proposals(&self) -> Result<Vec<EventProposal>, AppError> {
        let rows = sqlx::query(
            "SELECT id, proposal, created_at, updated_at FROM event_proposals ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(self.pool().await?)
        .await?;

        Ok(rows.iter().map(event_proposal_from_row).collect())
    }

    /// Get an event proposal by ID.
    pub async fn get_event_proposal(&self, id: &str) -> Result<Option<EventProposal>, AppError> {
        let row = sqlx::query(
            "SELECT id, proposal, created_at, updated_at FROM event_proposals WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool().await?)
        .await?;

        Ok(row.as_ref().map(event_proposal_from_row))
    }

    /// Create a new event proposal from already-trimmed text.
    pub async fn create_event_proposal(&self, proposal: &str) -> Result<EventProposal, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO event_proposals (id, proposal, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(proposal)
        .bind(&now)
        .bind(&now)
        .execute(self.pool().await?)
        .await?;

        Ok(EventProposal {
            id,
            proposal: proposal.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Replace the text of an event proposal.
    pub async fn update_event_proposal(
        &self,
        id: &str,
        proposal: &str,
    ) -> Result<EventProposal, AppError> {
        let existing = self
            .get_event_proposal(id)
            .await?
            .ok_or_else(|| event_proposal_not_found(id))?;
        let now = timestamp();

        let result =
            sqlx::query("UPDATE event_proposals SET proposal = ?, updated_at = ? WHERE id = ?")
                .bind(proposal)
                .bind(&now)
                .bind(id)
                .execute(self.pool().await?)
                .await?;

        if result.rows_affected() == 0 {
            return Err(event_proposal_not_found(id));
        }

        Ok(EventProposal {
            proposal: proposal.to_string(),
            updated_at: now,
            ..existing
        })
    }

    /// Delete an event proposal.
    pub async fn delete_event_proposal(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM event_proposals WHERE id = ?")
            .bind(id)
            .execute(self.pool().await?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(event_proposal_not_found(id));
        }
        Ok(())
    }

    // ==================== SUPPORT TICKET OPERATIONS ====================

    /// List support tickets, newest first.
    pub async fn list_support_tickets(
        &self,
        status: Option<TicketStatus>,
    ) -> Result<Vec<SupportTicket>, AppError> {
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query(
            "SELECT id, name, email, subject, message, status, created_at, updated_at FROM support_tickets WHERE (? IS NULL OR status = ?) ORDER BY created_at DESC, rowid DESC"
        )
        .bind(status)
        .bind(status)
        .fetch_all(self.pool().await?)
        .await?;

        Ok(rows.iter().map(support_ticket_from_row).collect())
    }

    /// Get a support ticket by ID.
    pub async fn get_support_ticket(&self, id: &str) -> Result<Option<SupportTicket>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, subject, message, status, created_at, updated_at FROM support_tickets WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(self.pool().await?)
        .await?;

        Ok(row.as_ref().map(support_ticket_from_row))
    }

    /// Open a new support ticket.
    pub async fn create_support_ticket(
        &self,
        request: &CreateSupportTicketRequest,
        status: TicketStatus,
    ) -> Result<SupportTicket, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();
        let ticket = SupportTicket {
            id,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            subject: request.subject.trim().to_string(),
            message: request.message.clone(),
            status,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO support_tickets (id, name, email, subject, message, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&ticket.id)
        .bind(&ticket.name)
        .bind(&ticket.email)
        .bind(&ticket.subject)
        .bind(&ticket.message)
        .bind(ticket.status.as_str())
        .bind(&ticket.created_at)
        .bind(&ticket.updated_at)
        .execute(self.pool().await?)
        .await?;

        Ok(ticket)
    }

    /// Apply a partial update to a support ticket.
    pub async fn update_support_ticket(
        &self,
        id: &str,
        request: &UpdateSupportTicketRequest,
        status: Option<TicketStatus>,
    ) -> Result<SupportTicket, AppError> {
        let existing = self
            .get_support_ticket(id)
            .await?
            .ok_or_else(|| support_ticket_not_found(id))?;

        let updated = SupportTicket {
            name: trimmed_or(request.name.as_ref(), &existing.name),
            email: trimmed_or(request.email.as_ref(), &existing.email),
            subject: trimmed_or(request.subject.as_ref(), &existing.subject),
            message: request.message.clone().unwrap_or(existing.message.clone()),
            status: status.unwrap_or(existing.status),
            updated_at: timestamp(),
            ..existing
        };

        let result = sqlx::query(
            "UPDATE support_tickets SET name = ?, email = ?, subject = ?, message = ?, status = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&updated.name)
        .bind(&updated.email)
        .bind(&updated.subject)
        .bind(&updated.message)
        .bind(updated.status.as_str())
        .bind(&updated.updated_at)
        .bind(id)
        .execute(self.pool().await?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(support_ticket_not_found(id));
        }
        Ok(updated)
    }

    /// Delete a support ticket.
    pub async fn delete_support_ticket(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM support_tickets WHERE id = ?")
            .bind(id)
            .execute(self.pool().await?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(support_ticket_not_found(id));
        }
        Ok(())
    }

    // ==================== SUBSCRIBER OPERATIONS ====================

    /// List subscribers, newest first, optionally by active flag.
    pub async fn list_subscribers(
        &self,
        active: Option<bool>,
    ) -> Result<Vec<PodcastSubscriber>, AppError> {
        let active = active.map(|a| a as i32);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM podcast_subscribers WHERE (? IS NULL OR is_active = ?) ORDER BY created_at DESC, rowid DESC",
            SUBSCRIBER_COLUMNS
        ))
        .bind(active)
        .bind(active)
        .fetch_all(self.pool().await?)
        .await?;

        Ok(rows.iter().map(subscriber_from_row).collect())
    }

    /// Get a subscriber by ID.
    pub async fn get_subscriber(&self, id: &str) -> Result<Option<PodcastSubscriber>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM podcast_subscribers WHERE id = ?",
            SUBSCRIBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool().await?)
        .await?;

        Ok(row.as_ref().map(subscriber_from_row))
    }

    /// Get a subscriber by normalized email.
    pub async fn get_subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PodcastSubscriber>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM podcast_subscribers WHERE email = ?",
            SUBSCRIBER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(self.pool().await?)
        .await?;

        Ok(row.as_ref().map(subscriber_from_row))
    }

    /// Subscribe an email. Existing records are reused, never duplicated.
    pub async fn subscribe(
        &self,
        email: &str,
    ) -> Result<(PodcastSubscriber, SubscribeOutcome), AppError> {
        if let Some(existing) = self.get_subscriber_by_email(email).await? {
            return self.resubscribe(existing).await;
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        let result = sqlx::query(
            "INSERT INTO podcast_subscribers (id, email, is_active, date_subscribed, date_unsubscribed, created_at, updated_at) VALUES (?, ?, 1, ?, NULL, ?, ?) ON CONFLICT(email) DO NOTHING"
        )
        .bind(&id)
        .bind(email)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(self.pool().await?)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race with a concurrent subscribe for the same email
            let existing = self.get_subscriber_by_email(email).await?.ok_or_else(|| {
                AppError::Internal(format!("Subscriber {} vanished during insert", email))
            })?;
            return self.resubscribe(existing).await;
        }

        Ok((
            PodcastSubscriber {
                id,
                email: email.to_string(),
                is_active: true,
                date_subscribed: now.clone(),
                date_unsubscribed: None,
                created_at: now.clone(),
                updated_at: now,
            },
            SubscribeOutcome::Created,
        ))
    }

    async fn resubscribe(
        &self,
        existing: PodcastSubscriber,
    ) -> Result<(PodcastSubscriber, SubscribeOutcome), AppError> {
        if existing.is_active {
            return Ok((existing, SubscribeOutcome::AlreadyActive));
        }

        let now = timestamp();
        sqlx::query(
            "UPDATE podcast_subscribers SET is_active = 1, date_subscribed = ?, date_unsubscribed = NULL, updated_at = ? WHERE id = ?"
        )
        .bind(&now)
        .bind(&now)
        .bind(&existing.id)
        .execute(self.pool().await?)
        .await?;

        Ok((
            PodcastSubscriber {
                is_active: true,
                date_subscribed: now.clone(),
                date_unsubscribed: None,
                updated_at: now,
                ..existing
            },
            SubscribeOutcome::Reactivated,
        ))
    }

    /// Apply a partial update to a subscriber. `email` must be normalized.
    pub async fn update_subscriber(
        &self,
        id: &str,
        email: Option<String>,
        is_active: Option<bool>,
    ) -> Result<PodcastSubscriber, AppError> {
        let existing = self
            .get_subscriber(id)
            .await?
            .ok_or_else(|| subscriber_not_found(id))?;

        if let Some(email) = &email {
            if let Some(owner) = self.get_subscriber_by_email(email).await? {
                if owner.id != existing.id {
                    return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
                }
            }
        }

        let now = timestamp();
        let active = is_active.unwrap_or(existing.is_active);
        let (date_subscribed, date_unsubscribed) = match (existing.is_active, active) {
            (true, false) => (existing.date_subscribed.clone(), Some(now.clone())),
            (false, true) => (now.clone(), None),
            _ => (
                existing.date_subscribed.clone(),
                existing.date_unsubscribed.clone(),
            ),
        };
        let email = email.unwrap_or(existing.email.clone());

        let result = sqlx::query(
            "UPDATE podcast_subscribers SET email = ?, is_active = ?, date_subscribed = ?, date_unsubscribed = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&email)
        .bind(active as i32)
        .bind(&date_subscribed)
        .bind(&date_unsubscribed)
        .bind(&now)
        .bind(id)
        .execute(self.pool().await?)
        .await
        .map_err(email_write_error)?;

        if result.rows_affected() == 0 {
            return Err(subscriber_not_found(id));
        }

        Ok(PodcastSubscriber {
            email,
            is_active: active,
            date_subscribed,
            date_unsubscribed,
            updated_at: now,
            ..existing
        })
    }

    /// Soft-delete: mark the subscriber inactive, keeping the record.
    pub async fn unsubscribe(&self, id: &str) -> Result<PodcastSubscriber, AppError> {
        self.update_subscriber(id, None, Some(false)).await
    }

    // ==================== LISTING OPERATIONS ====================

    /// List marketplace items, newest first.
    pub async fn list_listings(
        &self,
        category: Option<&str>,
        status: Option<ListingStatus>,
    ) -> Result<Vec<Listing>, AppError> {
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query(&format!(
            "SELECT {} FROM listings WHERE (? IS NULL OR category = ?) AND (? IS NULL OR status = ?) ORDER BY created_at DESC, rowid DESC",
            LISTING_COLUMNS
        ))
        .bind(category)
        .bind(category)
        .bind(status)
        .bind(status)
        .fetch_all(self.pool().await?)
        .await?;

        Ok(rows.iter().map(listing_from_row).collect())
    }

    /// Get a listing by ID.
    pub async fn get_listing(&self, id: &str) -> Result<Option<Listing>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM listings WHERE id = ?", LISTING_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool().await?)
            .await?;

        Ok(row.as_ref().map(listing_from_row))
    }

    /// Create a new listing. `image` is the already-hosted URL, if any.
    pub async fn create_listing(
        &self,
        request: &CreateListingRequest,
        defaults: ListingDefaults,
        image: Option<String>,
    ) -> Result<Listing, AppError> {
        let now = timestamp();
        let listing = Listing {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            image,
            category: text_or_default(request.category.as_ref(), DEFAULT_LISTING_CATEGORY),
            price: defaults.price,
            hide_price: request.hide_price.unwrap_or(false),
            condition: defaults.condition,
            seller_name: request.seller_name.trim().to_string(),
            contact_email: request.contact_email.trim().to_string(),
            contact_phone: request
                .contact_phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            status: defaults.status,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO listings (id, name, description, image, category, price, hide_price, condition, seller_name, contact_email, contact_phone, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&listing.id)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(&listing.image)
        .bind(&listing.category)
        .bind(listing.price)
        .bind(listing.hide_price as i32)
        .bind(listing.condition.as_str())
        .bind(&listing.seller_name)
        .bind(&listing.contact_email)
        .bind(&listing.contact_phone)
        .bind(listing.status.as_str())
        .bind(&listing.created_at)
        .bind(&listing.updated_at)
        .execute(self.pool().await?)
        .await?;

        Ok(listing)
    }

    /// Apply a partial update to a listing.
    pub async fn update_listing(
        &self,
        id: &str,
        request: &UpdateListingRequest,
        changes: ListingChanges,
    ) -> Result<Listing, AppError> {
        let existing = self
            .get_listing(id)
            .await?
            .ok_or_else(|| listing_not_found(id))?;

        let updated = Listing {
            name: trimmed_or(request.name.as_ref(), &existing.name),
            description: request
                .description
                .clone()
                .unwrap_or(existing.description.clone()),
            image: request.image.clone().or(existing.image.clone()),
            category: patched_or_default(
                request.category.as_ref(),
                &existing.category,
                DEFAULT_LISTING_CATEGORY,
            ),
            price: request.price.unwrap_or(existing.price),
            hide_price: request.hide_price.unwrap_or(existing.hide_price),
            condition: changes.condition.unwrap_or(existing.condition),
            seller_name: trimmed_or(request.seller_name.as_ref(), &existing.seller_name),
            contact_email: trimmed_or(request.contact_email.as_ref(), &existing.contact_email),
            // A blank phone clears it
            contact_phone: match &request.contact_phone {
                Some(phone) => Some(phone.trim().to_string()).filter(|p| !p.is_empty()),
                None => existing.contact_phone.clone(),
            },
            status: changes.status.unwrap_or(existing.status),
            updated_at: timestamp(),
            ..existing
        };

        let result = sqlx::query(
            "UPDATE listings SET name = ?, description = ?, image = ?, category = ?, price = ?, hide_price = ?, condition = ?, seller_name = ?, contact_email = ?, contact_phone = ?, status = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(&updated.image)
        .bind(&updated.category)
        .bind(updated.price)
        .bind(updated.hide_price as i32)
        .bind(updated.condition.as_str())
        .bind(&updated.seller_name)
        .bind(&updated.contact_email)
        .bind(&updated.contact_phone)
        .bind(updated.status.as_str())
        .bind(&updated.updated_at)
        .bind(id)
        .execute(self.pool().await?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(listing_not_found(id));
        }
        Ok(updated)
    }

    /// Delete a listing.
    pub async fn delete_listing(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(self.pool().await?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(listing_not_found(id));
        }
        Ok(())
    }
}

// Helper functions for row conversion

/// Fixed-width UTC timestamp, so text ordering matches time ordering.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn trimmed_or(value: Option<&String>, existing: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| existing.to_string())
}

/// Supplied value (trimmed, `default` when blank) or the stored one.
fn patched_or_default(value: Option<&String>, existing: &str, default: &str) -> String {
    match value {
        Some(_) => text_or_default(value, default),
        None => existing.to_string(),
    }
}

/// A concurrent writer can claim the email between the check and the update.
fn email_write_error(err: sqlx::Error) -> AppError {
    if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
        return AppError::Validation(DUPLICATE_EMAIL.to_string());
    }
    err.into()
}

fn blog_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Blog post {} not found", id))
}

fn event_proposal_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Event proposal {} not found", id))
}

fn support_ticket_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Support ticket {} not found", id))
}

fn subscriber_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Subscriber {} not found", id))
}

fn listing_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Listing {} not found", id))
}

fn parse_comments(s: &str) -> Vec<Comment> {
    serde_json::from_str(s).unwrap_or_default()
}

fn blog_post_from_row(row: &SqliteRow) -> BlogPost {
    let comments: String = row.get("comments");
    BlogPost {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        category: row.get("category"),
        image: row.get("image"),
        author: row.get("author"),
        likes: row.get("likes"),
        comments: parse_comments(&comments),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn event_proposal_from_row(row: &SqliteRow) -> EventProposal {
    EventProposal {
        id: row.get("id"),
        proposal: row.get("proposal"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn support_ticket_from_row(row: &SqliteRow) -> SupportTicket {
    let status: String = row.get("status");
    SupportTicket {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        subject: row.get("subject"),
        message: row.get("message"),
        status: TicketStatus::parse(&status).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn subscriber_from_row(row: &SqliteRow) -> PodcastSubscriber {
    let is_active: i32 = row.get("is_active");
    PodcastSubscriber {
        id: row.get("id"),
        email: row.get("email"),
        is_active: is_active != 0,
        date_subscribed: row.get("date_subscribed"),
        date_unsubscribed: row.get("date_unsubscribed"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn listing_from_row(row: &SqliteRow) -> Listing {
    let hide_price: i32 = row.get("hide_price");
    let condition: String = row.get("condition");
    let status: String = row.get("status");
    Listing {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        image: row.get("image"),
        category: row.get("category"),
        price: row.get("price"),
        hide_price: hide_price != 0,
        condition: ItemCondition::parse(&condition).unwrap_or_default(),
        seller_name: row.get("seller_name"),
        contact_email: row.get("contact_email"),
        contact_phone: row.get("contact_phone"),
        status: ListingStatus::parse(&status).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PoolSettings;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}", temp_dir.path().join("repo.sqlite").display());
        let db = Arc::new(Database::new(url, PoolSettings::default()));
        (Repository::new(db), temp_dir)
    }

    fn post_request(title: &str) -> CreateBlogPostRequest {
        CreateBlogPostRequest {
            title: title.into(),
            content: "Body".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unlike_clamps_at_zero() {
        let (repo, _dir) = repo().await;
        let post = repo.create_blog_post(&post_request("Pomodoro"), None).await.unwrap();
        assert_eq!(post.likes, 0);

        let after = repo.unlike_blog_post(&post.id).await.unwrap();
        assert_eq!(after.likes, 0);
    }

    #[tokio::test]
    async fn test_unlike_decrements_existing_likes() {
        let (repo, _dir) = repo().await;
        let post = repo.create_blog_post(&post_request("Feynman"), None).await.unwrap();
        sqlx::query("UPDATE blog_posts SET likes = 2 WHERE id = ?")
            .bind(&post.id)
            .execute(repo.pool().await.unwrap())
            .await
            .unwrap();

        assert_eq!(repo.unlike_blog_post(&post.id).await.unwrap().likes, 1);
        assert_eq!(repo.unlike_blog_post(&post.id).await.unwrap().likes, 0);
        assert_eq!(repo.unlike_blog_post(&post.id).await.unwrap().likes, 0);
    }

    #[tokio::test]
    async fn test_comments_append_in_order() {
        let (repo, _dir) = repo().await;
        let post = repo.create_blog_post(&post_request("Mind maps"), None).await.unwrap();

        for (content, author) in [("First", None), ("Second", Some("Kim".to_string()))] {
            repo.add_comment(
                &post.id,
                &CreateCommentRequest {
                    content: content.into(),
                    author,
                },
            )
            .await
            .unwrap();
        }

        let comments = repo.list_comments(&post.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "First");
        assert_eq!(comments[0].author, ANONYMOUS_AUTHOR);
        assert_eq!(comments[1].author, "Kim");
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let (repo, _dir) = repo().await;
        let err = repo
            .add_comment(
                "missing",
                &CreateCommentRequest {
                    content: "Hello".into(),
                    author: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent_and_reactivates() {
        let (repo, _dir) = repo().await;

        let (first, outcome) = repo.subscribe("a@b.com").await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::Created);

        let (again, outcome) = repo.subscribe("a@b.com").await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::AlreadyActive);
        assert_eq!(again.id, first.id);

        let gone = repo.unsubscribe(&first.id).await.unwrap();
        assert!(!gone.is_active);
        assert!(gone.date_unsubscribed.is_some());

        let (back, outcome) = repo.subscribe("a@b.com").await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::Reactivated);
        assert_eq!(back.id, first.id);
        assert!(back.is_active);
        assert!(back.date_unsubscribed.is_none());

        assert_eq!(repo.list_subscribers(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subscriber_email_change_must_be_unique() {
        let (repo, _dir) = repo().await;
        let (a, _) = repo.subscribe("a@b.com").await.unwrap();
        repo.subscribe("c@d.com").await.unwrap();

        let err = repo
            .update_subscriber(&a.id, Some("c@d.com".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_missing_ticket_leaves_store_untouched() {
        let (repo, _dir) = repo().await;
        let err = repo
            .update_support_ticket("nope", &UpdateSupportTicketRequest::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.list_support_tickets(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_recency() {
        let (repo, _dir) = repo().await;
        let older = repo
            .create_blog_post(
                &CreateBlogPostRequest {
                    category: Some("Focus".into()),
                    ..post_request("Older")
                },
                None,
            )
            .await
            .unwrap();
        let newer = repo.create_blog_post(&post_request("Newer"), None).await.unwrap();

        let all = repo.list_blog_posts(None).await.unwrap();
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);

        let focus = repo.list_blog_posts(Some("Focus")).await.unwrap();
        assert_eq!(focus.len(), 1);
        assert_eq!(focus[0].id, older.id);
        assert_eq!(newer.category, DEFAULT_BLOG_CATEGORY);
    }

    fn listing_request() -> CreateListingRequest {
        CreateListingRequest {
            name: "Desk lamp".into(),
            description: "Warm light".into(),
            seller_name: "Sam".into(),
            contact_email: "sam@uni.edu".into(),
            contact_phone: Some("555 0100".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_updates_on_missing_ids_leave_store_untouched() {
        let (repo, _dir) = repo().await;

        let err = repo
            .update_blog_post("nope", &UpdateBlogPostRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = repo
            .update_event_proposal("nope", "Trivia night")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = repo
            .update_subscriber("nope", Some("a@b.com".into()), Some(false))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = repo
            .update_listing(
                "nope",
                &UpdateListingRequest::default(),
                ListingChanges::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        assert!(repo.list_blog_posts(None).await.unwrap().is_empty());
        assert!(repo.list_event_proposals().await.unwrap().is_empty());
        assert!(repo.list_subscribers(None).await.unwrap().is_empty());
        assert!(repo.list_listings(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_patch_values_fall_back_to_defaults() {
        let (repo, _dir) = repo().await;

        let post = repo
            .create_blog_post(
                &CreateBlogPostRequest {
                    category: Some("Focus".into()),
                    author: Some("Kim".into()),
                    ..post_request("Deep work")
                },
                None,
            )
            .await
            .unwrap();
        let post = repo
            .update_blog_post(
                &post.id,
                &UpdateBlogPostRequest {
                    category: Some("  ".into()),
                    author: Some("".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(post.category, DEFAULT_BLOG_CATEGORY);
        assert_eq!(post.author, ANONYMOUS_AUTHOR);

        let request = CreateListingRequest {
            category: Some("Furniture".into()),
            ..listing_request()
        };
        let defaults = request.validate().unwrap();
        let listing = repo.create_listing(&request, defaults, None).await.unwrap();

        let updated = repo
            .update_listing(
                &listing.id,
                &UpdateListingRequest {
                    category: Some("".into()),
                    contact_phone: Some("  555 0199 ".into()),
                    ..Default::default()
                },
                ListingChanges::default(),
            )
            .await
            .unwrap();
        assert_eq!(updated.category, DEFAULT_LISTING_CATEGORY);
        assert_eq!(updated.contact_phone.as_deref(), Some("555 0199"));

        let cleared = repo
            .update_listing(
                &listing.id,
                &UpdateListingRequest {
                    contact_phone: Some(" ".into()),
                    ..Default::default()
                },
                ListingChanges::default(),
            )
            .await
            .unwrap();
        assert!(cleared.contact_phone.is_none());
        assert_eq!(
            repo.get_listing(&listing.id).await.unwrap().unwrap().category,
            DEFAULT_LISTING_CATEGORY
        );
    }

    #[tokio::test]
    async fn test_unique_violation_reported_as_duplicate_email() {
        let (repo, _dir) = repo().await;
        let (a, _) = repo.subscribe("a@b.com").await.unwrap();
        repo.subscribe("c@d.com").await.unwrap();

        // Same write a racing update would make after passing the read check
        let err = sqlx::query("UPDATE podcast_subscribers SET email = ? WHERE id = ?")
            .bind("c@d.com")
            .bind(&a.id)
            .execute(repo.pool().await.unwrap())
            .await
            .unwrap_err();

        match email_write_error(err) {
            AppError::Validation(msg) => assert_eq!(msg, DUPLICATE_EMAIL),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }
}

use crate::entities::newsletter_sub_entity as subscribers;
use crate::error::{AppError, AppResult};
use crate::external::{BrevoService, NewsletterEmail, NewsletterMailer};
use crate::models::*;
use crate::utils::validate_email;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

#[derive(Clone)]
pub struct NewsletterService<M: NewsletterMailer = BrevoService> {
    pool: DatabaseConnection,
    mailer: M,
}

impl<M: NewsletterMailer> NewsletterService<M> {
    pub fn new(pool: DatabaseConnection, mailer: M) -> Self {
        Self { pool, mailer }
    }

    /// 订阅；邮箱先规范化，重复订阅返回冲突
    pub async fn subscribe(&self, email: &str) -> AppResult<()> {
        let email = validate_email(email)?;

        let result = subscribers::ActiveModel {
            email: Set(email.clone()),
            subscribed_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await;

        match result {
            Ok(_) => {
                log::info!("New newsletter subscriber");
                Ok(())
            }
            Err(e) if AppError::is_unique_violation(&e) => {
                Err(AppError::Conflict("Email already subscribed".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_subscribers(&self) -> AppResult<Vec<SubscriberResponse>> {
        let list = subscribers::Entity::find()
            .order_by_desc(subscribers::Column::SubscribedAt)
            .order_by_desc(subscribers::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 群发给全部订阅者
    pub async fn send_newsletter(
        &self,
        request: SendNewsletterRequest,
    ) -> AppResult<SendNewsletterResponse> {
        let subject = request.subject.trim();
        if subject.is_empty() || request.html_content.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Subject and content are required".to_string(),
            ));
        }

        let recipients: Vec<String> = subscribers::Entity::find()
            .select_only()
            .column(subscribers::Column::Email)
            .order_by_asc(subscribers::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;
        if recipients.is_empty() {
            return Err(AppError::ValidationError("No subscribers".to_string()));
        }

        let count = recipients.len();
        let message_id = self
            .mailer
            .send_newsletter(NewsletterEmail {
                subject: subject.to_string(),
                html_content: request.html_content,
                recipients,
            })
            .await?;

        Ok(SendNewsletterResponse {
            recipients: count,
            message_id,
        })
    }
}

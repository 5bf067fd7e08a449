use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SlackConfig;
use crate::models::Review;

/// Moderation alerts for review activity
pub struct NotificationService {
    client: Client,
    slack: Option<SlackNotifier>,
    on_new_review: bool,
    on_hidden: bool,
}

impl NotificationService {
    pub fn new(slack_config: &SlackConfig) -> Self {
        let slack = if slack_config.enabled {
            slack_config
                .webhook_url
                .as_ref()
                .map(|url| SlackNotifier::new(url.clone(), slack_config.channel.clone()))
        } else {
            None
        };

        Self {
            client: Client::new(),
            slack,
            on_new_review: slack_config.on_new_review,
            on_hidden: slack_config.on_hidden,
        }
    }

    /// Send notification for a newly submitted review
    pub async fn notify_new_review(&self, review: &Review) -> Result<()> {
        match self.slack {
            Some(ref slack) if self.on_new_review => {
                slack.post(&self.client, new_review_alert(review)).await
            }
            _ => Ok(()),
        }
    }

    /// Send notification when a moderator hides a review
    pub async fn notify_hidden(&self, review: &Review) -> Result<()> {
        match self.slack {
            Some(ref slack) if self.on_hidden => {
                slack.post(&self.client, hidden_alert(review)).await
            }
            _ => Ok(()),
        }
    }
}

/// Webhook payload: a fallback line plus one markdown section per line
#[derive(Debug, Serialize)]
struct ReviewAlert {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    text: String,
    blocks: Vec<Section>,
}

#[derive(Debug, Serialize)]
struct Section {
    #[serde(rename = "type")]
    kind: &'static str,
    text: Markdown,
}

#[derive(Debug, Serialize)]
struct Markdown {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl ReviewAlert {
    fn new(headline: String, details: Vec<String>) -> Self {
        let blocks = std::iter::once(headline.clone())
            .chain(details)
            .map(|text| Section {
                kind: "section",
                text: Markdown {
                    kind: "mrkdwn",
                    text,
                },
            })
            .collect();

        Self {
            channel: None,
            text: headline,
            blocks,
        }
    }
}

fn new_review_alert(review: &Review) -> ReviewAlert {
    let stars = "★".repeat(usize::from(review.rating));
    ReviewAlert::new(
        format!(
            "📝 New review for product {} by {} {}",
            review.product_id, review.user_name, stars
        ),
        vec![
            format!("> {}", review.comment),
            format!("Review ID: `{}`", review.id),
        ],
    )
}

fn hidden_alert(review: &Review) -> ReviewAlert {
    ReviewAlert::new(
        format!(
            "🙈 Review `{}` on product {} by {} was hidden",
            review.id, review.product_id, review.user_name
        ),
        Vec::new(),
    )
}

/// Slack incoming-webhook target
struct SlackNotifier {
    webhook_url: String,
    channel: Option<String>,
}

impl SlackNotifier {
    fn new(webhook_url: String, channel: Option<String>) -> Self {
        Self {
            webhook_url,
            channel,
        }
    }

    async fn post(&self, client: &Client, mut alert: ReviewAlert) -> Result<()> {
        alert.channel = self.channel.clone();

        let response = client
            .post(&self.webhook_url)
            .json(&alert)
            .send()
            .await
            .context("Failed to reach Slack webhook")?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Review alert delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Slack rejected review alert");
        anyhow::bail!("Slack webhook returned error: {} - {}", status, body)
    }
}

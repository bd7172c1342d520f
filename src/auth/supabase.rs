use super::UserStore;
use crate::models::{NewUser, UserRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

const USER_COLUMNS: &str = "id,name,email,phone,password_hash,created_at,plan";

/// `users` table behind Supabase's PostgREST API.
pub struct SupabaseUserStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseUserStore {
    pub fn new(base_url: String, service_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self::new_with_client(base_url, service_key, client)
    }

    pub fn new_with_client(base_url: String, service_key: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn users_url(&self) -> String {
        format!("{}/rest/v1/users", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn rows(response: Response) -> Result<Vec<UserRecord>> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Supabase error (status {}): {}", status, error_text);
            return Err(Error::UserStore(format!(
                "Supabase error (status {}): {}",
                status, error_text
            )));
        }

        Ok(response.json().await?)
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<UserRecord>> {
        let response = self
            .authorized(self.client.get(self.users_url()))
            .query(&[
                ("select", USER_COLUMNS.to_string()),
                (column, format!("eq.{}", value)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to query Supabase users: {}", e);
                e
            })?;

        Ok(Self::rows(response).await?.into_iter().next())
    }
}

#[async_trait]
impl UserStore for SupabaseUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.find_one("email", email).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        self.find_one("id", id).await
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord> {
        let email = user.email.clone();
        let response = self
            .authorized(self.client.post(self.users_url()))
            .query(&[("select", USER_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(&[user])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert Supabase user: {}", e);
                e
            })?;

        // Unique violation on users.email
        if response.status() == StatusCode::CONFLICT {
            tracing::warn!("Supabase rejected duplicate email {}", email);
            return Err(Error::DuplicateEmail(email));
        }

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::UserStore("Insert returned no row".to_string()))
    }
}

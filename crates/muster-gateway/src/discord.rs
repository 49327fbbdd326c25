//! Discord REST adapter
//!
//! Implements [`ChatPlatform`] over the Discord v10 HTTP API for a single
//! guild. Inbound events do not come through here; see [`crate::intake`].

use crate::error::{GatewayError, GatewayResult};
use crate::settings::Settings;
use async_trait::async_trait;
use muster_core::{ChannelId, ChatPlatform, Member, MemberId, MessageId, PlatformError, Role, RoleId};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write as _;
use std::time::Duration;

const PAGE_SIZE: usize = 1000;
const AUDIT_REASON_HEADER: &str = "X-Audit-Log-Reason";

/// Discord REST client bound to one guild
#[derive(Debug, Clone)]
pub struct DiscordRest {
    client: Client,
    base_url: String,
    guild_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    discriminator: Option<String>,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct ApiMember {
    user: ApiUser,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRole {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: String,
}

impl From<ApiMember> for Member {
    fn from(api: ApiMember) -> Self {
        let ApiMember { user, nick, roles } = api;
        let tag = match user.discriminator.as_deref() {
            Some(d) if d != "0" => format!("{}#{d}", user.username),
            _ => user.username.clone(),
        };
        let display_name = nick
            .or(user.global_name)
            .unwrap_or_else(|| user.username.clone());
        Self {
            id: MemberId::new(user.id),
            display_name,
            tag,
            roles: roles.into_iter().map(RoleId::new).collect(),
            bot: user.bot,
        }
    }
}

impl DiscordRest {
    /// Create a client for `guild_id`
    ///
    /// # Errors
    /// - `GatewayError::InvalidToken` if the token cannot form a header
    /// - `GatewayError::Client` if the HTTP client cannot be built
    pub fn new(api_base: &str, guild_id: impl Into<String>, token: &str) -> GatewayResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|_| GatewayError::InvalidToken("token".to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!(
                "DiscordBot (https://github.com/example/muster, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: api_base.trim_end_matches('/').to_string(),
            guild_id: guild_id.into(),
        })
    }

    /// Create a client from gateway settings and the token environment variable
    ///
    /// # Errors
    /// Same as [`DiscordRest::new`], plus `GatewayError::MissingToken`.
    pub fn from_settings(settings: &Settings) -> GatewayResult<Self> {
        let token = settings.token()?;
        Self::new(&settings.gateway.api_base, &settings.gateway.guild_id, &token)
            .map_err(|e| match e {
                GatewayError::InvalidToken(_) => {
                    GatewayError::InvalidToken(settings.gateway.token_env.clone())
                }
                other => other,
            })
    }

    /// Guild this client manages
    #[inline]
    #[must_use]
    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn member_path(&self, member: &MemberId) -> String {
        format!("/guilds/{}/members/{member}", self.guild_id)
    }

    fn member_role_path(&self, member: &MemberId, role: &RoleId) -> String {
        format!("/guilds/{}/members/{member}/roles/{role}", self.guild_id)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, PlatformError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::NOT_FOUND {
            Err(PlatformError::NotFound(what.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), what, %message, "platform rejected request");
            Err(PlatformError::rejected(status.as_u16(), message))
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
        response.json().await.map_err(transport)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PlatformError> {
        let request = self.client.get(self.url(path)).query(query);
        Self::decode(self.send(request, path).await?).await
    }

    async fn post_message(
        &self,
        channel: &str,
        body: serde_json::Value,
    ) -> Result<(), PlatformError> {
        let path = format!("/channels/{channel}/messages");
        let request = self.client.post(self.url(&path)).json(&body);
        self.send(request, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for DiscordRest {
    async fn members(&self) -> Result<Vec<Member>, PlatformError> {
        let path = format!("/guilds/{}/members", self.guild_id);
        let limit = PAGE_SIZE.to_string();
        let mut after = "0".to_string();
        let mut members = Vec::new();

        loop {
            let page: Vec<ApiMember> = self
                .get(&path, &[("limit", limit.as_str()), ("after", after.as_str())])
                .await?;
            let full_page = page.len() == PAGE_SIZE;
            if let Some(last) = page.last() {
                after.clone_from(&last.user.id);
            }
            members.extend(page.into_iter().map(Member::from));
            if !full_page {
                break;
            }
        }

        tracing::debug!(count = members.len(), "fetched guild members");
        Ok(members)
    }

    async fn roles(&self) -> Result<Vec<Role>, PlatformError> {
        let path = format!("/guilds/{}/roles", self.guild_id);
        let roles: Vec<ApiRole> = self.get(&path, &[]).await?;
        Ok(roles
            .into_iter()
            .map(|r| Role::new(r.id, r.name))
            .collect())
    }

    async fn add_role(&self, member: &MemberId, role: &RoleId) -> Result<(), PlatformError> {
        let path = self.member_role_path(member, role);
        self.send(self.client.put(self.url(&path)), &path).await?;
        Ok(())
    }

    async fn remove_role(&self, member: &MemberId, role: &RoleId) -> Result<(), PlatformError> {
        let path = self.member_role_path(member, role);
        self.send(self.client.delete(self.url(&path)), &path).await?;
        Ok(())
    }

    async fn set_roles(&self, member: &MemberId, roles: &[RoleId]) -> Result<(), PlatformError> {
        let path = self.member_path(member);
        let request = self
            .client
            .patch(self.url(&path))
            .json(&json!({ "roles": roles }));
        self.send(request, &path).await?;
        Ok(())
    }

    async fn kick(&self, member: &MemberId, reason: &str) -> Result<(), PlatformError> {
        let path = self.member_path(member);
        let request = self
            .client
            .delete(self.url(&path))
            .header(AUDIT_REASON_HEADER, encode_reason(reason));
        self.send(request, &path).await?;
        Ok(())
    }

    async fn send_direct(&self, member: &MemberId, text: &str) -> Result<(), PlatformError> {
        let path = "/users/@me/channels";
        let request = self
            .client
            .post(self.url(path))
            .json(&json!({ "recipient_id": member }));
        let channel: ApiChannel = Self::decode(self.send(request, path).await?).await?;
        self.post_message(&channel.id, json!({ "content": text }))
            .await
    }

    async fn send_channel(&self, channel: &ChannelId, text: &str) -> Result<(), PlatformError> {
        self.post_message(channel.as_str(), json!({ "content": text }))
            .await
    }

    async fn reply(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        text: &str,
    ) -> Result<(), PlatformError> {
        self.post_message(
            channel.as_str(),
            json!({
                "content": text,
                "message_reference": { "message_id": message, "fail_if_not_exists": false },
            }),
        )
        .await
    }
}

#[allow(clippy::needless_pass_by_value)]
fn transport(e: reqwest::Error) -> PlatformError {
    PlatformError::Transport(e.to_string())
}

/// Percent-encode an audit-log reason for the header
fn encode_reason(reason: &str) -> String {
    let mut out = String::with_capacity(reason.len());
    for byte in reason.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

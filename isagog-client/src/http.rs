// Copyright 2025 Isagog Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Shared request plumbing

use crate::error::{ClientError, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::error;

pub(crate) fn build_client(timeout: Duration) -> Result<HttpClient> {
    Ok(HttpClient::builder().timeout(timeout).build()?)
}

/// Sends `request` and decodes a JSON reply; non-success statuses become
/// [`ClientError::Api`].
pub(crate) async fn send<T: DeserializeOwned>(request: RequestBuilder, operation: &str) -> Result<T> {
    let response = request.header(ACCEPT, "application/json").send().await?;
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        error!(operation, status = status.as_u16(), %message, "service request failed");
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let result = response.json().await?;
    Ok(result)
}

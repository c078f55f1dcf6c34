// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! REST access to the upstream keyed store.
//!
//! Only point reads and delete-by-key are available over REST; live
//! subscriptions are served by the local store once a snapshot is pulled.

use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::error::{Error, Result};
use crate::models::{Collection, CollectionPath, collection_from_value};

pub struct RemoteStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RemoteStore {
    pub fn new(client: Client, base_url: &str, auth_token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.is_empty()),
        }
    }

    /// `<base>/<collection>/<user>[/<id>].json[?auth=<token>]`
    pub fn resource_url(&self, path: &CollectionPath, id: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, path);
        if let Some(id) = id {
            url.push('/');
            url.push_str(id);
        }
        url.push_str(".json");
        if let Some(token) = &self.auth_token {
            url.push_str("?auth=");
            url.push_str(token);
        }
        url
    }

    pub fn read(&self, path: &CollectionPath) -> Result<Option<Collection>> {
        let url = self.resource_url(path, None);
        log::debug!("GET {}", path);
        let resp = self.client.get(&url).send().map_err(|e| {
            let err = Error::from(e);
            log::warn!("read of {} failed: {}", path, err);
            err
        })?;
        check_status(resp.status(), path)?;
        let body: serde_json::Value = resp.json()?;
        Ok(collection_from_value(body))
    }

    pub fn delete(&self, path: &CollectionPath, id: &str) -> Result<()> {
        let url = self.resource_url(path, Some(id));
        log::debug!("DELETE {}/{}", path, id);
        let resp = self.client.delete(&url).send()?;
        check_status(resp.status(), path)
    }
}

pub fn check_status(status: StatusCode, path: &CollectionPath) -> Result<()> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(Error::PermissionDenied(path.to_string()))
        }
        StatusCode::NOT_FOUND => Err(Error::NotFound(path.to_string())),
        s => Err(Error::UpstreamUnavailable(format!("{} returned {}", path, s))),
    }
}

//! Request descriptions for every endpoint the client talks to.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{ApiError, ClientError};
use super::store::{Collection, ResourceKey, ResourceKind};
use crate::pantry::dto::{ByNameRequest, TransferRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// One JSON exchange. `path` is relative to the API root (`/api/v1`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub owner: Uuid,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, owner: Uuid) -> Self {
        Self {
            method,
            path: path.into(),
            owner,
            body: None,
        }
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn list(key: ResourceKey) -> Self {
        Self::new(Method::Get, key.kind.path(), key.owner)
    }

    pub fn create<T: Serialize>(key: ResourceKey, body: &T) -> Result<Self, ClientError> {
        Self::new(Method::Post, key.kind.path(), key.owner).json(body)
    }

    pub fn update<T: Serialize>(key: ResourceKey, id: Uuid, body: &T) -> Result<Self, ClientError> {
        Self::new(Method::Put, format!("{}/{id}", key.kind.path()), key.owner).json(body)
    }

    pub fn delete(key: ResourceKey, id: Uuid) -> Self {
        Self::new(Method::Delete, format!("{}/{id}", key.kind.path()), key.owner)
    }

    pub fn move_to_saved(owner: Uuid, name: &str) -> Result<Self, ClientError> {
        Self::new(Method::Post, "/pantry/saved", owner).json(&ByNameRequest { name: name.into() })
    }

    pub fn move_from_saved(owner: Uuid, name: &str) -> Result<Self, ClientError> {
        Self::new(Method::Post, "/pantry/restore", owner).json(&ByNameRequest { name: name.into() })
    }

    pub fn move_to_cart(owner: Uuid, transfer: &TransferRequest) -> Result<Self, ClientError> {
        Self::new(Method::Post, "/pantry/to-cart", owner).json(transfer)
    }

    pub fn move_to_pantry(owner: Uuid, transfer: &TransferRequest) -> Result<Self, ClientError> {
        Self::new(Method::Post, "/shopping-list/to-pantry", owner).json(transfer)
    }
}

/// Decodes a response body; `204 No Content` arrives as `Value::Null`.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    Ok(serde_json::from_value(value)?)
}

pub fn decode_collection(kind: ResourceKind, value: Value) -> Result<Collection, ApiError> {
    let decoded = match kind {
        ResourceKind::Meals => serde_json::from_value(value).map(Collection::Meals),
        ResourceKind::Pantry => serde_json::from_value(value).map(Collection::Pantry),
        ResourceKind::ShoppingList => serde_json::from_value(value).map(Collection::ShoppingList),
    };
    // Reported as a server fault; the cached value stays as it was.
    decoded.map_err(|e| ApiError::Server {
        status: 200,
        message: format!("malformed {} listing: {e}", kind.path()),
    })
}

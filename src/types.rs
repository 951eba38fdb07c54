/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Mutations recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Restore, // Undo soft-delete by clearing deleted_at
    Link,
    Unlink,
    Upload,
    Notify,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Restore => "restore",
            Operation::Link => "link",
            Operation::Unlink => "unlink",
            Operation::Upload => "upload",
            Operation::Notify => "notify",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of record an operation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    CatalogItem,
    Resource,
    CatalogItemResource,
    WhatsAppMessage,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::CatalogItem => "catalog_item",
            Entity::Resource => "resource",
            Entity::CatalogItemResource => "catalog_item_resource",
            Entity::WhatsAppMessage => "whatsapp_message",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

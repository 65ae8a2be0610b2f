//! Core data types for the workspace organizer.
//!
//! A [`Workspace`] owns an ordered collection of [`Page`]s; each page owns
//! its [`Attachment`]s. [`NewContentItem`] is the flattened note/image input
//! shape that the store maps onto pages. All types serialize with serde and
//! export TypeScript bindings for the web client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generate a fresh entity identifier.
///
/// Identifiers are UUID v4 strings, assigned once at creation and never
/// reused or mutated afterwards.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The authenticated user, as reported by the identity collaborator.
///
/// The sync core treats `id` as an opaque key scoping which workspaces are
/// visible; it never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct User {
    /// Opaque user identifier
    pub id: String,
    /// Email address the user signed up with
    pub email: String,
}

/// Kind of attachment payload. Currently only images exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// An image, referenced by URL or carried inline as a data URI
    Image,
}

/// An image resource owned by a single page.
///
/// Deleting the page (or its workspace) deletes the attachment with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Attachment {
    /// Attachment identifier
    pub id: String,
    /// Payload kind
    pub kind: AttachmentKind,
    /// A URL or an inline `data:` URI
    pub url: String,
    /// Display name (usually the original filename)
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Encode raw bytes as an inline `data:` URI, guessing the media type
    /// from the display name's extension.
    pub fn data_uri(bytes: &[u8], name: &str) -> String {
        use base64::Engine as _;
        use base64::engine::general_purpose::STANDARD;

        let mime = match name.rsplit('.').next().map(str::to_ascii_lowercase) {
            Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
            Some(ext) if ext == "gif" => "image/gif",
            Some(ext) if ext == "webp" => "image/webp",
            Some(ext) if ext == "svg" => "image/svg+xml",
            _ => "image/png",
        };

        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }
}

/// A titled rich-text document belonging to one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Page {
    /// Page identifier
    pub id: String,
    /// Title shown in navigation
    pub title: String,
    /// HTML body
    pub body: String,
    /// Whether the page is publicly viewable through its share link
    pub public: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Attachments owned by this page
    pub attachments: Vec<Attachment>,
}

impl Page {
    /// Position of an attachment by id, if present.
    pub fn attachment_index(&self, attachment_id: &str) -> Option<usize> {
        self.attachments.iter().position(|a| a.id == attachment_id)
    }
}

/// Top-level user-owned container of pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Workspace {
    /// Workspace identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Whether the workspace is publicly viewable through its share link
    pub public: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
    /// Currently selected page. A weak reference: if set, it names a page
    /// in `pages`, and deleting that page moves it to another remaining
    /// page or clears it.
    pub current_page_id: Option<String>,
    /// Pages owned by this workspace, in creation order
    pub pages: Vec<Page>,
}

impl Workspace {
    /// Look up a page by id.
    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    /// Look up a page by id, mutably.
    pub fn page_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == page_id)
    }

    /// The currently selected page, if any.
    pub fn current_page(&self) -> Option<&Page> {
        self.current_page_id.as_deref().and_then(|id| self.page(id))
    }
}

/// Kind of a flattened content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A plain note; `content` is its text body
    Note,
    /// An image; `content` is a URL or data URI
    Image,
}

/// The alternate flattened input model: a note or image added directly to a
/// workspace without the caller constructing a page first. The store maps a
/// note to a page with that body, and an image to a page with one embedded
/// attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewContentItem {
    /// Note or image
    pub kind: ContentKind,
    /// Title for the created page
    pub title: String,
    /// Text body (note) or image payload (image)
    pub content: String,
}

/// A partial update to a page. Only the fields that are set are applied
/// locally and carried in the remote update; absent fields are left
/// untouched on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PageUpdate {
    /// New title, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New HTML body, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// New visibility flag, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

impl PageUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title field.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the body field.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the visibility field.
    pub fn public(mut self, public: bool) -> Self {
        self.public = Some(public);
        self
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.public.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_data_uri_mime_from_extension() {
        let uri = Attachment::data_uri(b"abc", "photo.JPG");
        assert!(uri.starts_with("data:image/jpeg;base64,"));

        let uri = Attachment::data_uri(b"abc", "diagram.svg");
        assert!(uri.starts_with("data:image/svg+xml;base64,"));

        // Unknown extensions fall back to png
        let uri = Attachment::data_uri(b"abc", "noext");
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_page_update_builder() {
        let update = PageUpdate::new().title("X").public(true);
        assert_eq!(update.title.as_deref(), Some("X"));
        assert_eq!(update.body, None);
        assert_eq!(update.public, Some(true));
        assert!(!update.is_empty());
        assert!(PageUpdate::new().is_empty());
    }

    #[test]
    fn test_page_update_serializes_only_set_fields() {
        let update = PageUpdate::new().title("X");
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "X" }));
    }

    #[test]
    fn test_workspace_page_lookup() {
        let page = Page {
            id: "p1".into(),
            title: "Todo".into(),
            body: String::new(),
            public: false,
            created_at: Utc::now(),
            attachments: vec![],
        };
        let ws = Workspace {
            id: "w1".into(),
            name: "Notes".into(),
            public: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            current_page_id: Some("p1".into()),
            pages: vec![page],
        };

        assert_eq!(ws.page("p1").map(|p| p.title.as_str()), Some("Todo"));
        assert!(ws.page("p2").is_none());
        assert_eq!(ws.current_page().map(|p| p.id.as_str()), Some("p1"));
    }
}

//! Verification documents (licence scans, ID photos) for staff approval.
//!
//! Bytes go to the object store under `{userId}/{millis}_{name}`; metadata
//! lives at `document:{userId}` and only the latest upload is kept.

use chrono::Utc;
use uuid::Uuid;

use crate::audit;
use crate::authorization::require_self_or_admin;
use crate::config::MAX_DOCUMENT_BYTES;
use crate::core_state::{CoreError, CoreState};
use crate::db;
use crate::models::{AuditAction, AuditLogEntry, User, VerificationDocument};

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "application/pdf"];
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Stored bytes plus the type to serve them with.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub document: VerificationDocument,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn validate(upload: &DocumentUpload) -> Result<(), CoreError> {
    if upload.bytes.is_empty() || upload.file_name.trim().is_empty() {
        return Err(CoreError::Validation("No file provided".into()));
    }
    if upload.bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(CoreError::Validation("File size exceeds 10MB limit".into()));
    }
    let type_ok = upload
        .content_type
        .as_deref()
        .is_some_and(|ct| ALLOWED_CONTENT_TYPES.contains(&ct.to_ascii_lowercase().as_str()));
    if !type_ok && !has_allowed_extension(&upload.file_name) {
        return Err(CoreError::Validation(
            "Invalid file type. Only JPG, PNG, and PDF are allowed.".into(),
        ));
    }
    Ok(())
}

/// Replace everything outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

fn store(
    state: &CoreState,
    owner: &User,
    actor: &Uuid,
    upload: DocumentUpload,
) -> Result<VerificationDocument, CoreError> {
    validate(&upload)?;

    let now = Utc::now();
    let path = format!(
        "{}/{}_{}",
        owner.id,
        now.timestamp_millis(),
        sanitize_file_name(upload.file_name.trim())
    );
    let content_type = upload
        .content_type
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .unwrap_or_else(|| {
            mime_guess::from_path(&upload.file_name)
                .first_or_octet_stream()
                .to_string()
        });

    state.objects().put(&path, &upload.bytes)?;

    let document = VerificationDocument {
        user_id: owner.id,
        file_name: upload.file_name,
        file_path: path.clone(),
        content_type,
        file_size: upload.bytes.len() as u64,
        uploaded_at: now,
    };
    let mut owner = owner.clone();
    owner.verification_document = Some(path);
    state.store().with_conn(|conn| {
        db::put_document(conn, &document)?;
        db::put_user(conn, &owner)
    })?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::UploadDocument, *actor)
            .target(owner.id)
            .meta("fileSize", document.file_size),
    );
    tracing::info!(user_id = %owner.id, size = document.file_size, "Verification document stored");
    Ok(document)
}

/// Upload for the signed-in caller.
pub fn upload(state: &CoreState, caller: &User, file: DocumentUpload) -> Result<VerificationDocument, CoreError> {
    // Re-read so the user write does not clobber fields changed since the token was resolved.
    let owner = state
        .user(&caller.id)?
        .ok_or_else(|| CoreError::NotFound("User not found".into()))?;
    store(state, &owner, &caller.id, file)
}

/// Upload during signup, before the account can sign in.
pub fn upload_for_signup(
    state: &CoreState,
    user_id: &Uuid,
    file: DocumentUpload,
) -> Result<VerificationDocument, CoreError> {
    let owner = state
        .user(user_id)?
        .ok_or_else(|| CoreError::NotFound("User not found. Please try signing up again.".into()))?;
    store(state, &owner, user_id, file)
}

/// Latest document metadata for `user_id`, if any.
pub fn get(state: &CoreState, caller: &User, user_id: &Uuid) -> Result<Option<VerificationDocument>, CoreError> {
    require_self_or_admin(caller, user_id)?;
    Ok(state.store().with_conn(|conn| db::get_document(conn, user_id))?)
}

pub fn download(state: &CoreState, caller: &User, user_id: &Uuid) -> Result<DocumentFile, CoreError> {
    let document = get(state, caller, user_id)?
        .ok_or_else(|| CoreError::NotFound("Document not found".into()))?;
    let bytes = state.objects().get(&document.file_path)?;
    let content_type = mime_guess::from_path(&document.file_path)
        .first_raw()
        .map(str::to_string)
        .unwrap_or_else(|| document.content_type.clone());
    Ok(DocumentFile {
        document,
        content_type,
        bytes,
    })
}
